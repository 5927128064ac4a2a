use thiserror::Error;

/// Document-store failures. All are transport class except
/// [`StoreError::NotConfigured`], which is a setup mistake.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("document store returned {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("unexpected document store response: {0}")]
    Decode(String),

    #[error("database {0} is not configured")]
    NotConfigured(&'static str),
}

impl StoreError {
    pub fn api(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// The store rejected the request structurally (unknown property,
    /// wrong property type). Only this triggers the core-properties fallback.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Api { status: 400, code, .. } if code == "validation_error")
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_400_validation_error_is_structural() {
        assert!(StoreError::api(400, "validation_error", "Foo is not a property").is_validation());
        assert!(!StoreError::api(400, "invalid_json", "bad body").is_validation());
        assert!(!StoreError::api(409, "conflict_error", "retry").is_validation());
        assert!(!StoreError::NotConfigured("briefs").is_validation());
    }

    #[test]
    fn test_not_found() {
        assert!(StoreError::api(404, "object_not_found", "gone").is_not_found());
        assert!(!StoreError::api(500, "internal_server_error", "x").is_not_found());
    }
}
