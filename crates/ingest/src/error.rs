use thiserror::Error;

/// Input errors: the document or page could not yield usable text.
///
/// None of these are retryable; callers surface them verbatim.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("could not parse PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("could not extract any text from the document")]
    NoText,

    #[error("extracted text is too short ({chars} chars, need at least {min})")]
    TooShort { chars: usize, min: usize },

    #[error("unsupported file format: {0:?}")]
    UnsupportedFormat(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("{url} returned non-HTML content ({content_type})")]
    NotHtml { url: String, content_type: String },

    #[error("could not locate article body in {0}")]
    NoArticleBody(String),
}
