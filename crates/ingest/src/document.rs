use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::IngestError;
use crate::reader::extract_pdf_text;

/// A document whose text has been extracted and is ready for screening.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: String,
    pub source: String,
    pub text: String,
}

impl Document {
    /// Extract the text of an uploaded PDF.
    ///
    /// The id is derived from the raw bytes, so re-uploading identical
    /// content yields the same id.
    pub fn from_pdf(bytes: &[u8], source: impl Into<String>) -> Result<Self, IngestError> {
        let text = extract_pdf_text(bytes)?;
        Ok(Self {
            doc_id: document_hash(bytes),
            source: source.into(),
            text,
        })
    }

    pub fn from_text(text: impl Into<String>, source: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            doc_id: document_hash(text.as_bytes()),
            source: source.into(),
            text,
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Stable document id: hex SHA-256 of the content.
pub fn document_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_content_sensitive() {
        assert_eq!(document_hash(b"abc"), document_hash(b"abc"));
        assert_ne!(document_hash(b"abc"), document_hash(b"abd"));
        assert_eq!(document_hash(b"abc").len(), 64);
    }

    #[test]
    fn test_from_text_counts_chars_not_bytes() {
        let doc = Document::from_text("Kyiv–Kharkiv", "pasted");
        assert_eq!(doc.char_count(), 12);
        assert_eq!(doc.source, "pasted");
    }
}
