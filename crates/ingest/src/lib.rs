pub mod article;
pub mod document;
pub mod error;
pub mod reader;

pub use article::{ArticleScraper, extract_article_text};
pub use document::{Document, document_hash};
pub use error::IngestError;
pub use reader::{FileReader, extract_pdf_text, join_pages};

use std::path::Path;

/// Below this many characters extracted text is treated as unusable
/// (paywalls, image-only scans, cookie banners).
pub const MIN_USABLE_CHARS: usize = 200;

/// Fail with [`IngestError::TooShort`] unless `text` has at least `min_chars` characters.
pub fn ensure_usable(text: &str, min_chars: usize) -> Result<(), IngestError> {
    let chars = text.trim().chars().count();
    if chars < min_chars {
        return Err(IngestError::TooShort {
            chars,
            min: min_chars,
        });
    }
    Ok(())
}

/// Read a PDF, text or markdown file from disk into a [`Document`].
pub async fn read_document(file_path: &Path) -> Result<Document, IngestError> {
    let text = FileReader::read_file(file_path).await?;
    let source = file_path.to_string_lossy().to_string();
    Ok(Document::from_text(text, source))
}
