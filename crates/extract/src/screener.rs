use ingest::{Document, MIN_USABLE_CHARS, ensure_usable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ExtractError;
use crate::llm::{GenerationRequest, ModelSettings, TextGenerator};
use crate::prompt::{SCREENING_SYSTEM_PROMPT, build_screening_message};
use crate::schema::ScreeningResult;
use crate::validator::validate_screening;

/// A document together with its screening verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenedDocument {
    pub document: Document,
    pub result: ScreeningResult,
}

/// Relevance screener: rubric prompt in, validated [`ScreeningResult`] out.
///
/// Stateless. Nothing is written anywhere and nothing is retried: a
/// malformed response is terminal for the invocation.
#[derive(Clone)]
pub struct Screener {
    generator: Arc<dyn TextGenerator>,
    settings: ModelSettings,
}

impl Screener {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: ModelSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    /// Send the (truncated) text with the screening rubric and return the raw reply.
    pub async fn request_screening(&self, text: &str) -> Result<String, ExtractError> {
        let request = GenerationRequest::new(
            &self.settings,
            SCREENING_SYSTEM_PROMPT,
            build_screening_message(text),
        )
        .cached();
        let raw = self.generator.generate(&request).await?;
        debug!(chars = raw.len(), "screening response received");
        Ok(raw)
    }

    /// Screen already-extracted text.
    pub async fn screen_text(&self, text: &str) -> Result<ScreeningResult, ExtractError> {
        ensure_usable(text, MIN_USABLE_CHARS)?;
        let raw = self.request_screening(text).await?;
        let result = validate_screening(&raw)?;
        info!(score = result.score, verdict = %result.verdict, "document screened");
        Ok(result)
    }

    /// Extract the text of an uploaded PDF and screen it.
    pub async fn screen_document(
        &self,
        bytes: &[u8],
        source: &str,
    ) -> Result<ScreenedDocument, ExtractError> {
        let document = Document::from_pdf(bytes, source)?;
        info!(doc_id = %document.doc_id, chars = document.char_count(), "screening document");
        let result = self.screen_text(&document.text).await?;
        Ok(ScreenedDocument { document, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::MAX_SCREENING_CHARS;
    use crate::schema::{AffectedDatabase, Verdict};
    use crate::testing::ScriptedGenerator;

    fn screener(generator: &ScriptedGenerator) -> Screener {
        Screener::new(
            Arc::new(generator.clone()),
            ModelSettings::new("screen-model", 1024),
        )
    }

    fn article() -> String {
        "The junta dissolved the electoral commission and announced military oversight of \
         regional councils. "
            .repeat(5)
    }

    #[tokio::test]
    async fn test_screen_text_validates_response() {
        let generator = ScriptedGenerator::new([r#"```json
{"score": 72, "verdict": "Strong Match", "reasoning": "Direct authority shift.",
 "affected_databases": ["Events Timeline", "Newsletter"], "key_signals": ["junta", "commission"]}
```"#]);
        let result = screener(&generator).screen_text(&article()).await.unwrap();

        assert_eq!(result.score, 72);
        assert_eq!(result.verdict, Verdict::StrongMatch);
        assert_eq!(result.affected_databases, vec![AffectedDatabase::EventsTimeline]);

        let calls = generator.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "screen-model");
        assert_eq!(calls[0].max_tokens, 1024);
        assert_eq!(calls[0].system, SCREENING_SYSTEM_PROMPT);
        assert!(calls[0].user.starts_with("Screen the following document:\n\n"));
    }

    #[tokio::test]
    async fn test_short_text_fails_before_model_call() {
        let generator = ScriptedGenerator::new(["{\"score\": 90}"]);
        let err = screener(&generator)
            .screen_text(&"x".repeat(150))
            .await
            .unwrap_err();

        assert!(err.is_input());
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_pdf_is_input_error() {
        let generator = ScriptedGenerator::new(["{\"score\": 90}"]);
        let err = screener(&generator)
            .screen_document(b"not a pdf", "upload.pdf")
            .await
            .unwrap_err();

        assert!(err.is_input());
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_response_is_not_retried() {
        let generator = ScriptedGenerator::new(["I'd rate this highly.", "{\"score\": 80}"]);
        let err = screener(&generator).screen_text(&article()).await.unwrap_err();

        assert!(matches!(err, ExtractError::MalformedResponse { .. }));
        assert_eq!(generator.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_api_failure_is_transport_error() {
        let generator = ScriptedGenerator::failing(529);
        let err = screener(&generator).screen_text(&article()).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_long_document_is_truncated_in_request() {
        let generator = ScriptedGenerator::new(["{\"score\": 5}"]);
        let text = "a".repeat(MAX_SCREENING_CHARS + 500);
        screener(&generator).screen_text(&text).await.unwrap();

        let request = &generator.calls()[0];
        assert!(request.user.ends_with("[Document truncated for screening]"));
        assert!(request.user.len() < text.len());
        assert!(request.cache_system);
        assert_eq!(request.system, SCREENING_SYSTEM_PROMPT);
    }
}
