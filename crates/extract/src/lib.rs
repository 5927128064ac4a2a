pub mod error;
pub mod llm;
pub mod normalizer;
pub mod prompt;
pub mod response;
pub mod schema;
pub mod screener;
pub mod testing;
pub mod validator;

pub use error::{ExtractError, LlmError};
pub use llm::{
    AnthropicClient, GenerationRequest, LlmConfig, ModelSettings, TextGenerator,
    generate_json_with_retry,
};
pub use normalizer::{CoercionWarning, EnumNormalizer};
pub use schema::{
    Actor, ActorType, AffectedDatabase, Dimension, DimensionScores, Event, EventType,
    ExtractionResult, Label, PfSignal, Reliability, ScreeningResult, Source, SourceType, Verdict,
};
pub use screener::{ScreenedDocument, Screener};
pub use validator::validate_screening;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Structured records extracted from one article, plus any enum corrections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub result: ExtractionResult,
    pub warnings: Vec<CoercionWarning>,
}

pub struct Extractor {
    generator: Arc<dyn TextGenerator>,
    settings: ModelSettings,
}

impl Extractor {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: ModelSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    /// Extract source, event and actors from raw article text.
    pub async fn extract_from_text(&self, text: &str) -> Result<Extraction, ExtractError> {
        if text.trim().is_empty() {
            return Err(ingest::IngestError::NoText.into());
        }

        let request =
            GenerationRequest::new(&self.settings, prompt::EXTRACTION_SYSTEM_PROMPT, text).cached();

        let extraction = generate_json_with_retry(
            self.generator.as_ref(),
            &request,
            prompt::STRICT_SUFFIX,
            |data| {
                let mut normalizer = EnumNormalizer::new();
                let result = normalizer.normalize_extraction(&data);
                Ok(Extraction {
                    result,
                    warnings: normalizer.into_warnings(),
                })
            },
        )
        .await?;

        info!(
            event = %extraction.result.event.event_name,
            actors = extraction.result.actors.len(),
            warnings = extraction.warnings.len(),
            "extraction complete"
        );
        Ok(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;

    const EXTRACTION: &str = r#"{
        "source": {"title": "Sahel update", "author_organization": "Reuters",
                   "publication_date": "2025-11-02", "source_type": "News",
                   "reliability": "High", "summary": "Junta expands."},
        "event": {"event_name": "Junta Dissolves Electoral Commission", "date": "2025-11-01",
                  "event_type": "Institutional reform", "description": "d",
                  "pf_signal": "Narrows"},
        "actors": [
            {"name": "Niger", "actor_type": "State", "role_in_event": "r", "iso3": "NER"},
            {"name": "Local strongman", "actor_type": "Warlord", "role_in_event": "r", "iso3": null}
        ]
    }"#;

    fn extractor(generator: &ScriptedGenerator) -> Extractor {
        Extractor::new(
            Arc::new(generator.clone()),
            ModelSettings::new("claude-haiku-4-5-20251001", 1024),
        )
    }

    #[tokio::test]
    async fn test_extraction_coerces_and_warns() {
        let generator = ScriptedGenerator::new([EXTRACTION]);
        let extraction = extractor(&generator)
            .extract_from_text("article text")
            .await
            .unwrap();

        assert_eq!(extraction.result.source.title, "Sahel update");
        assert_eq!(extraction.result.event.pf_signal, PfSignal::Narrows);
        assert_eq!(extraction.result.actors[1].actor_type, ActorType::NonState);
        assert_eq!(extraction.warnings.len(), 1);

        let calls = generator.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].cache_system);
        assert_eq!(calls[0].user, "article text");
    }

    #[tokio::test]
    async fn test_retry_once_with_strict_suffix() {
        let generator = ScriptedGenerator::new(["Here is the extraction you asked for", EXTRACTION]);
        let extraction = extractor(&generator)
            .extract_from_text("article text")
            .await
            .unwrap();

        assert_eq!(extraction.result.actors.len(), 2);
        let calls = generator.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].system.ends_with(prompt::STRICT_SUFFIX));
        assert!(!calls[0].system.ends_with(prompt::STRICT_SUFFIX));
    }

    #[tokio::test]
    async fn test_both_attempts_malformed() {
        let generator = ScriptedGenerator::new(["nope", "still nope"]);
        let err = extractor(&generator)
            .extract_from_text("article text")
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("nope"));
        assert!(message.contains("still nope"));
        assert_eq!(generator.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected_without_call() {
        let generator = ScriptedGenerator::new([EXTRACTION]);
        let err = extractor(&generator).extract_from_text("  \n").await.unwrap_err();
        assert!(err.is_input());
        assert!(generator.calls().is_empty());
    }
}
