use extract::LlmError;
use index::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BriefError {
    #[error("brief synthesis failed: {0}")]
    Generation(#[from] LlmError),

    #[error("briefs database is not configured")]
    NotConfigured,

    #[error("failed to save brief: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for BriefError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotConfigured(_) => BriefError::NotConfigured,
            other => BriefError::Store(other),
        }
    }
}
