use extract::ExtractError;
use index::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("actor context unavailable: {0}")]
    Context(#[source] StoreError),

    #[error(transparent)]
    Generation(#[from] ExtractError),

    #[error("failed to write scores: {0}")]
    WriteBack(#[source] StoreError),
}
