use thiserror::Error;

/// Failures of the text-generation call itself (transport class).
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request to text-generation service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("text-generation service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("text-generation response contained no text block")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The document could not yield usable text.
    #[error(transparent)]
    Input(#[from] ingest::IngestError),

    #[error("text generation failed: {0}")]
    Generation(#[from] LlmError),

    /// No parsable JSON object in the model output.
    #[error("no valid JSON object in model response ({detail}):\n{raw}")]
    MalformedResponse { raw: String, detail: String },

    #[error("model returned malformed JSON on both attempts.\nFirst response:\n{first}\nRetry response:\n{second}")]
    RetryExhausted { first: String, second: String },

    /// The JSON parsed but violates a contract that has no safe default.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },
}

impl ExtractError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Only an unparsable body earns the single stricter-prompt retry.
    pub fn is_retryable_parse(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. })
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Generation(_))
    }
}
