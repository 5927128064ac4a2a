use chrono::{SecondsFormat, Utc};
use extract::{Actor, Event, ExtractionResult, Label, Reliability, ScreeningResult, Source};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::DatabaseIds;
use crate::error::StoreError;
use crate::fields::{activity_log, actors, events, intel_feeds, sources};
use crate::filter::Filter;
use crate::page::PageRef;
use crate::properties::{Block, Properties};
use crate::store::{DocumentStore, QueryRequest};

pub const INGESTION_AGENT: &str = "Agent-A: Ingestion";

/// Create a page with the full property set, falling back to the `core`
/// subset only when the store rejects the write as structurally invalid.
pub async fn create_with_fallback(
    store: &dyn DocumentStore,
    database_id: &str,
    full: &Properties,
    core: &[&str],
    children: &[Block],
) -> Result<PageRef, StoreError> {
    match store.create_page(database_id, full, children).await {
        Ok(page) => Ok(page),
        Err(err) if err.is_validation() => {
            let core_properties = full.subset(core);
            if core_properties.len() == full.len() {
                return Err(err);
            }
            warn!(
                database_id,
                error = %err,
                dropped = full.len() - core_properties.len(),
                "full property set rejected, retrying with core properties"
            );
            store.create_page(database_id, &core_properties, children).await
        }
        Err(err) => Err(err),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedActor {
    pub page: PageRef,
    pub name: String,
    pub is_new: bool,
}

/// Pages written for one ingested article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteReport {
    pub source: PageRef,
    pub event: PageRef,
    pub intel_feed: PageRef,
    pub actors: Vec<ResolvedActor>,
}

impl WriteReport {
    pub fn actor_ids(&self) -> Vec<String> {
        self.actors.iter().map(|a| a.page.id.clone()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub log_title: String,
    pub agent_id: String,
    pub action_type: String,
    pub target_database: String,
    pub target_record: String,
    pub source_material: String,
    pub confidence: String,
    pub notes: String,
    pub status: String,
}

impl ActivityEntry {
    fn properties(&self) -> Properties {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut properties = Properties::new()
            .title(activity_log::LOG_TITLE, &self.log_title)
            .select(activity_log::AGENT_ID, &self.agent_id)
            .select(activity_log::ACTION_TYPE, &self.action_type)
            .date(activity_log::TIMESTAMP, timestamp)
            .select(activity_log::STATUS, &self.status)
            .select(activity_log::VISIBILITY, "Internal");

        for (name, value) in [
            (activity_log::TARGET_DATABASE, &self.target_database),
            (activity_log::CONFIDENCE, &self.confidence),
        ] {
            if !value.is_empty() {
                properties = properties.select(name, value);
            }
        }
        for (name, value) in [
            (activity_log::TARGET_RECORD, &self.target_record),
            (activity_log::SOURCE_MATERIAL, &self.source_material),
            (activity_log::NOTES, &self.notes),
        ] {
            if !value.is_empty() {
                properties = properties.rich_text(name, value);
            }
        }
        properties
    }
}

/// Write an activity-log entry. Never fails: errors are logged and dropped,
/// and nothing happens when no log database is configured.
pub async fn log_activity(
    store: &dyn DocumentStore,
    database_id: Option<&str>,
    entry: &ActivityEntry,
) -> Option<PageRef> {
    let Some(database_id) = database_id else {
        debug!("activity log not configured, skipping entry");
        return None;
    };

    match create_with_fallback(store, database_id, &entry.properties(), activity_log::CORE, &[]).await
    {
        Ok(page) => Some(page),
        Err(err) => {
            warn!(error = %err, title = %entry.log_title, "activity log write failed");
            None
        }
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() { default } else { value }
}

/// Maps extracted records onto the source, event, intel-feed, actor and
/// activity-log databases.
#[derive(Clone)]
pub struct PersistenceWriter {
    store: Arc<dyn DocumentStore>,
    databases: DatabaseIds,
}

impl PersistenceWriter {
    pub fn new(store: Arc<dyn DocumentStore>, databases: DatabaseIds) -> Self {
        Self { store, databases }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub async fn write_source(&self, source: &Source) -> Result<PageRef, StoreError> {
        let properties = Properties::new()
            .title(sources::TITLE, or_default(&source.title, "Untitled"))
            .select(sources::SOURCE_TYPE, source.source_type.as_str())
            .select(sources::RELIABILITY, source.reliability.as_str())
            .rich_text(sources::AUTHOR_ORGANIZATION, &source.author_organization)
            .rich_text(sources::SUMMARY, &source.summary)
            .optional_url(sources::URL, source.url.as_deref())
            .optional_date(sources::PUBLICATION_DATE, &source.publication_date);

        let page = create_with_fallback(
            self.store.as_ref(),
            &self.databases.sources,
            &properties,
            sources::CORE,
            &[],
        )
        .await?;
        info!(page = %page.url, "source written");
        Ok(page)
    }

    pub async fn write_event(&self, event: &Event, source_id: &str) -> Result<PageRef, StoreError> {
        let properties = Properties::new()
            .title(events::EVENT_NAME, or_default(&event.event_name, "Untitled Event"))
            .select(events::EVENT_TYPE, event.event_type.as_str())
            .rich_text(events::DESCRIPTION, &event.description)
            .select(events::PF_SIGNAL, event.pf_signal.as_str())
            .optional_date(events::DATE, &event.date)
            .relation(events::KEY_SOURCES, [source_id]);

        let page = create_with_fallback(
            self.store.as_ref(),
            &self.databases.events,
            &properties,
            events::CORE,
            &[],
        )
        .await?;
        info!(page = %page.url, "event written");
        Ok(page)
    }

    pub async fn write_intel_feed(
        &self,
        source: &Source,
        event: &Event,
        screening: &ScreeningResult,
        source_id: &str,
        event_id: &str,
    ) -> Result<PageRef, StoreError> {
        let properties = Properties::new()
            .title(intel_feeds::TITLE, or_default(&source.title, "Untitled"))
            .rich_text(intel_feeds::SO_WHAT_SUMMARY, &screening.reasoning)
            .number(intel_feeds::RELEVANCE_SCORE, screening.score)
            .select(intel_feeds::VERDICT, screening.verdict.as_str())
            .select(intel_feeds::GAP_IMPLICATION, event.pf_signal.as_str())
            .relation(intel_feeds::SOURCE, [source_id])
            .relation(intel_feeds::EVENT, [event_id]);

        let page = create_with_fallback(
            self.store.as_ref(),
            &self.databases.intel_feeds,
            &properties,
            intel_feeds::CORE,
            &[],
        )
        .await?;
        info!(page = %page.url, "intel feed written");
        Ok(page)
    }

    /// Exact, case-sensitive lookup by `Name`.
    pub async fn find_actor(&self, name: &str) -> Result<Option<PageRef>, StoreError> {
        let database_id = self.databases.actors()?;
        let request = QueryRequest::filtered(Filter::title_equals(actors::NAME, name)).with_page_size(1);
        let result = self.store.query(database_id, &request).await?;
        Ok(result.results.first().map(PageRef::from))
    }

    /// Reuse the first page with the identical name, else create one.
    ///
    /// The lookup and the create are not atomic: two concurrent runs naming
    /// the same new actor can both create it.
    pub async fn resolve_actor(&self, actor: &Actor) -> Result<ResolvedActor, StoreError> {
        if let Some(page) = self.find_actor(&actor.name).await? {
            debug!(name = %actor.name, page = %page.id, "reusing existing actor");
            return Ok(ResolvedActor {
                page,
                name: actor.name.clone(),
                is_new: false,
            });
        }

        let mut properties = Properties::new()
            .title(actors::NAME, &actor.name)
            .select(actors::ACTOR_TYPE, actor.actor_type.as_str())
            .rich_text(actors::NOTES, &actor.role_in_event);
        if let Some(iso3) = &actor.iso3 {
            properties = properties.rich_text(actors::ISO3, iso3);
        }

        let page = create_with_fallback(
            self.store.as_ref(),
            self.databases.actors()?,
            &properties,
            actors::CORE,
            &[],
        )
        .await?;
        info!(name = %actor.name, page = %page.url, "actor created");
        Ok(ResolvedActor {
            page,
            name: actor.name.clone(),
            is_new: true,
        })
    }

    pub async fn resolve_actors(&self, actors: &[Actor]) -> Result<Vec<ResolvedActor>, StoreError> {
        let mut resolved = Vec::with_capacity(actors.len());
        for actor in actors {
            if actor.name.trim().is_empty() {
                warn!("skipping actor without a name");
                continue;
            }
            resolved.push(self.resolve_actor(actor).await?);
        }
        Ok(resolved)
    }

    /// Point the event's `Key Actors` relation at the resolved actors.
    pub async fn link_actors(&self, event_id: &str, actor_ids: &[String]) -> Result<(), StoreError> {
        if actor_ids.is_empty() {
            return Ok(());
        }
        let properties = Properties::new().relation(events::KEY_ACTORS, actor_ids.iter().cloned());
        self.store.update_page(event_id, &properties).await?;
        Ok(())
    }

    pub async fn log_activity(&self, entry: &ActivityEntry) -> Option<PageRef> {
        log_activity(
            self.store.as_ref(),
            self.databases.activity_log.as_deref(),
            entry,
        )
        .await
    }

    /// Write every record for one screened, extracted article.
    pub async fn write_extraction(
        &self,
        extraction: &ExtractionResult,
        screening: &ScreeningResult,
    ) -> Result<WriteReport, StoreError> {
        // Fail before the first write rather than leave orphaned records.
        if extraction.actors.iter().any(|a| !a.name.trim().is_empty()) {
            self.databases.actors()?;
        }

        let source = self.write_source(&extraction.source).await?;
        let event = self.write_event(&extraction.event, &source.id).await?;
        let intel_feed = self
            .write_intel_feed(
                &extraction.source,
                &extraction.event,
                screening,
                &source.id,
                &event.id,
            )
            .await?;

        let actors = self.resolve_actors(&extraction.actors).await?;
        let report = WriteReport {
            source,
            event,
            intel_feed,
            actors,
        };
        self.link_actors(&report.event.id, &report.actor_ids()).await?;

        let source_title = or_default(&extraction.source.title, "Untitled");
        let confidence = match extraction.source.reliability {
            Reliability::High => "High",
            _ => "Medium",
        };
        let actor_names: Vec<&str> = report.actors.iter().map(|a| a.name.as_str()).collect();
        self.log_activity(&ActivityEntry {
            log_title: source_title.to_string(),
            agent_id: INGESTION_AGENT.to_string(),
            action_type: "Create".to_string(),
            target_database: "Events Timeline".to_string(),
            target_record: extraction.event.event_name.clone(),
            source_material: extraction.source.url.clone().unwrap_or_default(),
            confidence: confidence.to_string(),
            notes: format!(
                "Ingested source, event, intel feed and {} actor(s) from {}: {}",
                report.actors.len(),
                source_title,
                actor_names.join(", ")
            ),
            status: "Completed".to_string(),
        })
        .await;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use extract::{ActorType, EventType, PfSignal, SourceType};
    use serde_json::json;

    fn databases() -> DatabaseIds {
        DatabaseIds {
            sources: "sources".into(),
            events: "events".into(),
            intel_feeds: "intel".into(),
            actors: Some("actors".into()),
            activity_log: Some("log".into()),
            ..DatabaseIds::default()
        }
    }

    fn extraction() -> ExtractionResult {
        ExtractionResult {
            source: Source {
                title: "Sahel update".into(),
                author_organization: "Reuters".into(),
                publication_date: "2025-11-02".into(),
                source_type: SourceType::News,
                reliability: Reliability::High,
                summary: "Junta expands control.".into(),
                url: Some("https://example.test/sahel".into()),
            },
            event: Event {
                event_name: "Junta Dissolves Electoral Commission".into(),
                date: String::new(),
                event_type: EventType::InstitutionalReform,
                description: "d".into(),
                pf_signal: PfSignal::Narrows,
            },
            actors: vec![
                Actor {
                    name: "Niger".into(),
                    actor_type: ActorType::State,
                    role_in_event: "Host state".into(),
                    iso3: Some("NER".into()),
                },
                Actor {
                    name: "wagner group".into(),
                    actor_type: ActorType::Hybrid,
                    role_in_event: "Security partner".into(),
                    iso3: None,
                },
            ],
        }
    }

    fn screening() -> ScreeningResult {
        ScreeningResult::manual(72, "Direct authority shift.")
    }

    fn writer(store: &Arc<MemoryStore>) -> PersistenceWriter {
        PersistenceWriter::new(store.clone(), databases())
    }

    #[tokio::test]
    async fn test_write_extraction_links_records() {
        let store = Arc::new(MemoryStore::new());
        let report = writer(&store)
            .write_extraction(&extraction(), &screening())
            .await
            .unwrap();

        let source = store.page(&report.source.id).unwrap();
        assert_eq!(source.text(sources::TITLE), "Sahel update");
        assert_eq!(source.select(sources::RELIABILITY).as_deref(), Some("High"));
        assert!(source.property(sources::URL).is_some());

        let event = store.page(&report.event.id).unwrap();
        assert_eq!(event.relation_ids(events::KEY_SOURCES), vec![report.source.id.clone()]);
        assert_eq!(event.relation_ids(events::KEY_ACTORS), report.actor_ids());
        assert!(event.property(events::DATE).is_none());

        let feed = store.page(&report.intel_feed.id).unwrap();
        assert_eq!(feed.number(intel_feeds::RELEVANCE_SCORE), Some(72.0));
        assert_eq!(feed.select(intel_feeds::VERDICT).as_deref(), Some("Strong Match"));
        assert_eq!(feed.select(intel_feeds::GAP_IMPLICATION).as_deref(), Some("Narrows"));

        assert_eq!(report.actors.len(), 2);
        assert!(report.actors.iter().all(|a| a.is_new));
        let log = store.pages("log");
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].select(activity_log::VISIBILITY).as_deref(), Some("Internal"));
        assert!(report.source.url.starts_with("https://notion.so/"));
    }

    #[tokio::test]
    async fn test_actor_dedup_is_exact_name() {
        let store = Arc::new(MemoryStore::new());
        let existing = store.insert_page(
            "actors",
            json!({"Name": {"title": [{"plain_text": "Wagner Group"}]}}),
            "2025-01-01T00:00:00Z",
        );
        let writer = writer(&store);

        let reused = writer
            .resolve_actor(&Actor {
                name: "Wagner Group".into(),
                actor_type: ActorType::Hybrid,
                role_in_event: "r".into(),
                iso3: None,
            })
            .await
            .unwrap();
        assert!(!reused.is_new);
        assert_eq!(reused.page.id, existing);

        let different_case = writer
            .resolve_actor(&Actor {
                name: "wagner group".into(),
                actor_type: ActorType::Hybrid,
                role_in_event: "r".into(),
                iso3: None,
            })
            .await
            .unwrap();
        assert!(different_case.is_new);
        assert_eq!(store.pages("actors").len(), 2);
    }

    #[tokio::test]
    async fn test_validation_rejection_falls_back_to_core() {
        let store = Arc::new(MemoryStore::new().with_schema("sources", sources::CORE));
        let page = writer(&store).write_source(&extraction().source).await.unwrap();

        let written = store.page(&page.id).unwrap();
        assert_eq!(written.text(sources::TITLE), "Sahel update");
        assert!(written.property(sources::SUMMARY).is_none());
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried_with_core() {
        let store = Arc::new(MemoryStore::new());
        store.fail_database("sources");
        let err = writer(&store).write_source(&extraction().source).await.unwrap_err();
        assert!(!err.is_validation());
        assert!(store.pages("sources").is_empty());
    }

    #[tokio::test]
    async fn test_activity_log_failure_does_not_fail_ingestion() {
        let store = Arc::new(MemoryStore::new());
        store.fail_database("log");
        let report = writer(&store)
            .write_extraction(&extraction(), &screening())
            .await
            .unwrap();
        assert_eq!(report.actors.len(), 2);
        assert!(store.pages("log").is_empty());
    }

    #[tokio::test]
    async fn test_activity_log_skipped_when_unconfigured() {
        let store = Arc::new(MemoryStore::new());
        let entry = ActivityEntry {
            log_title: "x".into(),
            ..Default::default()
        };
        assert!(log_activity(store.as_ref(), None, &entry).await.is_none());
    }

    #[tokio::test]
    async fn test_actors_require_configured_database() {
        let store = Arc::new(MemoryStore::new());
        let writer = PersistenceWriter::new(
            store.clone(),
            DatabaseIds {
                actors: None,
                ..databases()
            },
        );
        let err = writer.find_actor("Niger").await.unwrap_err();
        assert!(matches!(err, StoreError::NotConfigured("actors")));
    }

    #[tokio::test]
    async fn test_named_actors_without_actor_database_write_nothing() {
        let store = Arc::new(MemoryStore::new());
        let writer = PersistenceWriter::new(
            store.clone(),
            DatabaseIds {
                actors: None,
                ..databases()
            },
        );

        let err = writer
            .write_extraction(&extraction(), &screening())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotConfigured("actors")));
        for database in ["sources", "events", "intel", "log"] {
            assert!(store.pages(database).is_empty(), "{database} was written");
        }

        let mut no_actors = extraction();
        no_actors.actors.clear();
        let report = writer.write_extraction(&no_actors, &screening()).await.unwrap();
        assert!(report.actors.is_empty());
        assert_eq!(store.pages("sources").len(), 1);
    }
}
