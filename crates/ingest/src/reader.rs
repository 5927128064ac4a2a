use lopdf::Document as PdfDocument;
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::IngestError;

/// Separator placed between the text of consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

pub struct FileReader;

impl FileReader {
    /// Read a document from disk and return its plain text.
    ///
    /// PDFs go through [`extract_pdf_text`]; `.txt` and `.md` files are read as UTF-8.
    pub async fn read_file(path: &Path) -> Result<String, IngestError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match extension.as_str() {
            "pdf" => {
                let bytes = fs::read(path).await.map_err(|source| IngestError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                extract_pdf_text(&bytes)
            }
            "txt" | "md" => {
                let content = fs::read_to_string(path)
                    .await
                    .map_err(|source| IngestError::Io {
                        path: path.display().to_string(),
                        source,
                    })?;
                if content.trim().is_empty() {
                    return Err(IngestError::NoText);
                }
                Ok(content)
            }
            _ => Err(IngestError::UnsupportedFormat(extension)),
        }
    }
}

/// Extract the text of every page of an in-memory PDF.
///
/// Pages are visited in page order; pages yielding no text are skipped and
/// the rest are joined with a blank line.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, IngestError> {
    let document = PdfDocument::load_mem(bytes)?;
    let pages = document.get_pages();
    debug!(pages = pages.len(), "extracting PDF text");

    let texts = pages.keys().filter_map(|page_number| {
        match document.extract_text(&[*page_number]) {
            Ok(text) => Some(text),
            Err(e) => {
                // Image-only or malformed content streams; treat as an empty page.
                warn!(page = page_number, error = %e, "no text extracted from page");
                None
            }
        }
    });

    join_pages(texts)
}

/// Join per-page texts, skipping empty pages.
///
/// Fails with [`IngestError::NoText`] when nothing but whitespace remains.
pub fn join_pages<I>(pages: I) -> Result<String, IngestError>
where
    I: IntoIterator<Item = String>,
{
    let parts: Vec<String> = pages
        .into_iter()
        .filter(|text| !text.trim().is_empty())
        .collect();

    let joined = parts.join(PAGE_SEPARATOR);
    if joined.trim().is_empty() {
        return Err(IngestError::NoText);
    }
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_skips_empty_pages() {
        let pages = vec![
            "First page".to_string(),
            String::new(),
            "   \n".to_string(),
            "Third page".to_string(),
        ];
        assert_eq!(join_pages(pages).unwrap(), "First page\n\nThird page");
    }

    #[test]
    fn test_join_rejects_whitespace_only() {
        let pages = vec![" ".to_string(), "\n\t".to_string()];
        assert!(matches!(join_pages(pages), Err(IngestError::NoText)));
        assert!(matches!(join_pages(Vec::new()), Err(IngestError::NoText)));
    }

    #[test]
    fn test_join_keeps_page_text_verbatim() {
        let pages = vec!["  indented\nline  ".to_string()];
        assert_eq!(join_pages(pages).unwrap(), "  indented\nline  ");
    }

    #[test]
    fn test_garbage_bytes_are_not_a_pdf() {
        let result = extract_pdf_text(b"definitely not a pdf");
        assert!(matches!(result, Err(IngestError::Pdf(_))));
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let result = FileReader::read_file(Path::new("report.docx")).await;
        assert!(matches!(result, Err(IngestError::UnsupportedFormat(ext)) if ext == "docx"));
    }

    #[tokio::test]
    async fn test_missing_text_file_is_io_error() {
        let result = FileReader::read_file(Path::new("/nonexistent/powerflow/notes.txt")).await;
        assert!(matches!(result, Err(IngestError::Io { .. })));
    }
}
