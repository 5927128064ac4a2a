use index::fields::{actors, case_studies, events};
use index::{DocumentStore, Filter, Page, QueryRequest, StoreError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedEvent {
    pub event_name: String,
    /// ISO date, empty when the event has none.
    pub date: String,
    pub pf_signal: String,
    pub description: String,
}

impl From<&Page> for LinkedEvent {
    fn from(page: &Page) -> Self {
        Self {
            event_name: page.text(events::EVENT_NAME),
            date: page.date(events::DATE).unwrap_or_default(),
            pf_signal: page.select(events::PF_SIGNAL).unwrap_or_default(),
            description: page.text(events::DESCRIPTION),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseStudy {
    pub title: String,
    pub summary: String,
}

/// Everything the scoring prompt needs about one actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorContext {
    pub page_id: String,
    pub name: String,
    pub actor_type: String,
    pub linked_events: Vec<LinkedEvent>,
    pub linked_case_studies: Vec<CaseStudy>,
}

pub const DEFAULT_ACTOR_TYPE: &str = "Non-State";

/// Read the actor page, every event naming it under `Key Actors`, and its
/// linked case studies. Case studies that cannot be retrieved are skipped.
pub async fn fetch_actor_context(
    store: &dyn DocumentStore,
    events_database: &str,
    actor_page_id: &str,
) -> Result<ActorContext, StoreError> {
    let page = store.retrieve_page(actor_page_id).await?;

    let request = QueryRequest::filtered(Filter::relation_contains(events::KEY_ACTORS, actor_page_id));
    let linked_events = store
        .query_all(events_database, &request)
        .await?
        .iter()
        .map(LinkedEvent::from)
        .collect();

    let mut linked_case_studies = Vec::new();
    for case_id in page.relation_ids(actors::CASE_STUDIES) {
        match store.retrieve_page(&case_id).await {
            Ok(case) => linked_case_studies.push(CaseStudy {
                title: case.text_any(&[case_studies::TITLE, case_studies::NAME]),
                summary: case.text(case_studies::SUMMARY),
            }),
            Err(err) => warn!(case_id = %case_id, error = %err, "skipping case study"),
        }
    }

    let context = ActorContext {
        page_id: actor_page_id.to_string(),
        name: page.text(actors::NAME),
        actor_type: page
            .select(actors::ACTOR_TYPE)
            .unwrap_or_else(|| DEFAULT_ACTOR_TYPE.to_string()),
        linked_events,
        linked_case_studies,
    };
    debug!(
        actor = %context.name,
        events = context.linked_events.len(),
        case_studies = context.linked_case_studies.len(),
        "actor context fetched"
    );
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use index::MemoryStore;
    use serde_json::json;

    const EVENTS: &str = "events";

    fn seed(store: &MemoryStore) -> String {
        let case = store.insert_page(
            "cases",
            json!({
                "Name": {"title": [{"plain_text": "Tribal areas 2024"}]},
                "Summary": {"rich_text": [{"plain_text": "Long-run erosion."}]}
            }),
            "2026-01-01T00:00:00Z",
        );
        let actor = store.insert_page(
            "actors",
            json!({
                "Name": {"title": [{"plain_text": "Pakistan"}]},
                "Actor Type": {"select": {"name": "State"}},
                "Case Studies": {"relation": [{"id": case}, {"id": "missing-case"}]}
            }),
            "2026-01-01T00:00:00Z",
        );
        store.insert_page(
            EVENTS,
            json!({
                "Event Name": {"title": [{"plain_text": "Border airstrikes"}]},
                "Date": {"date": {"start": "2026-02-10"}},
                "PF Signal": {"select": {"name": "Widens"}},
                "Description": {"rich_text": [{"plain_text": "Strikes fail to dislodge TTP."}]},
                "Key Actors": {"relation": [{"id": actor}]}
            }),
            "2026-02-11T00:00:00Z",
        );
        store.insert_page(
            EVENTS,
            json!({"Event Name": {"title": [{"plain_text": "Unrelated"}]}}),
            "2026-02-12T00:00:00Z",
        );
        actor
    }

    #[tokio::test]
    async fn test_fetches_linked_records() {
        let store = MemoryStore::new();
        let actor = seed(&store);

        let context = fetch_actor_context(&store, EVENTS, &actor).await.unwrap();
        assert_eq!(context.name, "Pakistan");
        assert_eq!(context.actor_type, "State");
        assert_eq!(context.linked_events.len(), 1);
        assert_eq!(context.linked_events[0].date, "2026-02-10");
        assert_eq!(context.linked_events[0].pf_signal, "Widens");
        assert_eq!(
            context.linked_case_studies,
            vec![CaseStudy {
                title: "Tribal areas 2024".into(),
                summary: "Long-run erosion.".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_type_defaults_to_non_state() {
        let store = MemoryStore::new();
        let actor = store.insert_page(
            "actors",
            json!({"Name": {"title": [{"plain_text": "TTP"}]}}),
            "2026-01-01T00:00:00Z",
        );
        let context = fetch_actor_context(&store, EVENTS, &actor).await.unwrap();
        assert_eq!(context.actor_type, DEFAULT_ACTOR_TYPE);
        assert!(context.linked_events.is_empty());
        assert!(context.linked_case_studies.is_empty());
    }

    #[tokio::test]
    async fn test_missing_actor_is_an_error() {
        let store = MemoryStore::new();
        let err = fetch_actor_context(&store, EVENTS, "nope").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
