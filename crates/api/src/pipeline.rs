//! End-to-end flows: screen, ingest, score, brief.

use anyhow::{Context, Result};
use brief::{BriefFetcher, BriefWriter};
use extract::{
    AnthropicClient, CoercionWarning, Extraction, Extractor, ScreenedDocument, ScreeningResult,
    Screener, TextGenerator,
};
use index::{DocumentStore, NotionClient, PageRef, PersistenceWriter, WriteReport};
use ingest::ArticleScraper;
use score::{ActorScorer, ScoreOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;

pub const MANUAL_SCORE: u8 = 50;
pub const MANUAL_REASONING: &str = "Manually ingested.";

/// What one ingestion wrote and how the linked actors scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub write: WriteReport,
    pub warnings: Vec<CoercionWarning>,
    pub scores: Vec<ScoreOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefReport {
    pub date_range: String,
    pub text: String,
    pub page: Option<PageRef>,
}

pub struct Pipeline {
    screener: Screener,
    extractor: Extractor,
    writer: PersistenceWriter,
    scorer: ActorScorer,
    fetcher: BriefFetcher,
    brief_writer: BriefWriter,
}

impl Pipeline {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn DocumentStore>,
        config: &AppConfig,
    ) -> Self {
        let models = &config.models;
        let databases = &config.databases;
        Self {
            screener: Screener::new(generator.clone(), models.screener.clone()),
            extractor: Extractor::new(generator.clone(), models.extraction.clone()),
            writer: PersistenceWriter::new(store.clone(), databases.clone()),
            scorer: ActorScorer::new(
                generator.clone(),
                store.clone(),
                databases.events.clone(),
                models.score.clone(),
            ),
            fetcher: BriefFetcher::new(store.clone(), databases.clone()),
            brief_writer: BriefWriter::new(generator, store, databases.clone(), models.brief.clone()),
        }
    }

    /// Wire the live text-generation and document-store clients.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let generator = AnthropicClient::new(&config.llm).context("failed to build LLM client")?;
        let store = NotionClient::new(&config.notion).context("failed to build Notion client")?;
        Ok(Self::new(Arc::new(generator), Arc::new(store), config))
    }

    pub async fn screen_pdf(&self, bytes: &[u8], source: &str) -> Result<ScreenedDocument> {
        let screened = self.screener.screen_document(bytes, source).await?;
        Ok(screened)
    }

    pub async fn screen_text(&self, text: &str) -> Result<ScreeningResult> {
        Ok(self.screener.screen_text(text).await?)
    }

    /// Extraction only. Nothing is written.
    pub async fn preview(&self, text: &str) -> Result<Extraction> {
        Ok(self.extractor.extract_from_text(text).await?)
    }

    pub async fn fetch_article(&self, url: &str) -> Result<String> {
        let scraper = ArticleScraper::new()?;
        Ok(scraper.fetch(url).await?)
    }

    /// Extract, persist, then score every linked actor.
    pub async fn ingest(
        &self,
        text: &str,
        url: Option<&str>,
        screening: &ScreeningResult,
    ) -> Result<IngestReport> {
        let extraction = self.preview(text).await?;
        self.persist(extraction, url, screening).await
    }

    /// Persist an extraction already shown to the user.
    pub async fn persist(
        &self,
        extraction: Extraction,
        url: Option<&str>,
        screening: &ScreeningResult,
    ) -> Result<IngestReport> {
        let Extraction {
            mut result,
            warnings,
        } = extraction;
        if let Some(url) = url {
            result.source.url.get_or_insert_with(|| url.to_string());
        }

        let write = self
            .writer
            .write_extraction(&result, screening)
            .await
            .context("failed to write extraction")?;
        let scores = self.score(&write.actor_ids()).await;

        info!(
            source = %write.source.url,
            actors = write.actors.len(),
            scored = scores.iter().filter(|s| s.success).count(),
            "ingestion complete"
        );
        Ok(IngestReport {
            write,
            warnings,
            scores,
        })
    }

    /// Ingest pasted text or a URL without a screening pass.
    pub async fn ingest_manual(&self, text: Option<&str>, url: Option<&str>) -> Result<IngestReport> {
        let text = match (text, url) {
            (Some(text), _) if !text.trim().is_empty() => text.to_string(),
            (_, Some(url)) => self.fetch_article(url).await?,
            _ => anyhow::bail!("either text or a url is required"),
        };
        let screening = ScreeningResult::manual(MANUAL_SCORE, MANUAL_REASONING);
        self.ingest(&text, url, &screening).await
    }

    pub async fn score(&self, actor_ids: &[String]) -> Vec<ScoreOutcome> {
        if actor_ids.is_empty() {
            return Vec::new();
        }
        self.scorer.score_actors(actor_ids).await
    }

    /// Fetch, synthesise and optionally save a weekly brief.
    pub async fn brief(&self, lookback_days: u32, priority: &str, save: bool) -> Result<BriefReport> {
        let data = self.fetcher.fetch_all(lookback_days).await;
        let text = self.brief_writer.generate(&data, priority).await?;

        let page = if save {
            match self.brief_writer.save(&text, &data, priority).await {
                Ok(page) => {
                    self.brief_writer
                        .log_activity("Completed", &format!("Brief saved: {}", page.url))
                        .await;
                    Some(page)
                }
                Err(err) => {
                    warn!(error = %err, "failed to save brief");
                    self.brief_writer.log_activity("Failed", &err.to_string()).await;
                    return Err(err.into());
                }
            }
        } else {
            None
        };

        Ok(BriefReport {
            date_range: data.date_range,
            text,
            page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use extract::testing::ScriptedGenerator;
    use index::MemoryStore;
    use index::fields::{activity_log, actors, briefs};

    const EXTRACTION: &str = r#"{
        "source": {"title": "Sahel update", "author_organization": "Reuters",
                   "publication_date": "2025-11-02", "source_type": "News",
                   "reliability": "High", "summary": "Junta expands."},
        "event": {"event_name": "Junta Dissolves Electoral Commission", "date": "2025-11-01",
                  "event_type": "Institutional reform", "description": "d",
                  "pf_signal": "Narrows"},
        "actors": [{"name": "Niger", "actor_type": "State", "role_in_event": "r", "iso3": "NER"}]
    }"#;
    const SCORE: &str = r#"{"authority_score": 44, "reach_score": 21, "reasoning": "Junta consolidating."}"#;

    fn config() -> AppConfig {
        let mut config = AppConfig::from_lookup(|key| match key {
            "ANTHROPIC_API_KEY" => Some("sk".into()),
            "NOTION_API_KEY" => Some("secret".into()),
            _ => None,
        })
        .unwrap();
        config.databases.actors = Some("actors".into());
        config.databases.activity_log = Some("log".into());
        config.databases.briefs = Some("briefs".into());
        config
    }

    fn pipeline(generator: &ScriptedGenerator, store: &Arc<MemoryStore>) -> Pipeline {
        Pipeline::new(Arc::new(generator.clone()), store.clone(), &config())
    }

    #[tokio::test]
    async fn test_manual_ingest_writes_and_scores() {
        let generator = ScriptedGenerator::new([EXTRACTION, SCORE]);
        let store = Arc::new(MemoryStore::new());

        let report = pipeline(&generator, &store)
            .ingest_manual(Some("pasted article"), Some("https://example.test/a"))
            .await
            .unwrap();

        assert_eq!(report.write.actors.len(), 1);
        assert_eq!(report.scores.len(), 1);
        assert!(report.scores[0].success);

        let feeds = store.pages(&config().databases.intel_feeds);
        assert_eq!(feeds[0].number("Relevance Score"), Some(50.0));
        assert_eq!(feeds[0].text("So What Summary"), MANUAL_REASONING);

        let source = store.page(&report.write.source.id).unwrap();
        assert!(source.property("URL").is_some());

        let actor = store.page(&report.write.actors[0].page.id).unwrap();
        assert_eq!(actor.number(actors::AUTHORITY_SCORE), Some(44.0));
        assert_eq!(store.pages("log").len(), 1);
        assert_eq!(
            store.pages("log")[0].select(activity_log::CONFIDENCE).as_deref(),
            Some("High")
        );
    }

    #[tokio::test]
    async fn test_manual_ingest_needs_input() {
        let generator = ScriptedGenerator::default();
        let store = Arc::new(MemoryStore::new());
        let err = pipeline(&generator, &store)
            .ingest_manual(Some("  "), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("text or a url"));
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_brief_saved_and_logged() {
        let generator = ScriptedGenerator::new(["## THE HEADLINE\nQuiet week."]);
        let store = Arc::new(MemoryStore::new());

        let report = pipeline(&generator, &store)
            .brief(7, "", true)
            .await
            .unwrap();

        let page = report.page.unwrap();
        let saved = store.page(&page.id).unwrap();
        assert!(saved.text(briefs::TITLE).starts_with("Weekly Brief — "));
        assert_eq!(store.body(&page.id).len(), 2);
        let log = store.pages("log");
        assert_eq!(log[0].select(activity_log::STATUS).as_deref(), Some("Completed"));
    }

    #[tokio::test]
    async fn test_brief_without_save_writes_nothing() {
        let generator = ScriptedGenerator::new(["## THE HEADLINE\nQuiet week."]);
        let store = Arc::new(MemoryStore::new());

        let report = pipeline(&generator, &store)
            .brief(7, "Sahel", false)
            .await
            .unwrap();
        assert!(report.page.is_none());
        assert!(store.pages("briefs").is_empty());
        assert!(store.pages("log").is_empty());
    }
}
