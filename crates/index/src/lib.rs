pub mod error;
pub mod fields;
pub mod filter;
pub mod memory;
pub mod notion;
pub mod page;
pub mod properties;
pub mod store;
pub mod writer;

pub use error::StoreError;
pub use filter::{Condition, Direction, Filter, Sort};
pub use memory::MemoryStore;
pub use notion::{NotionClient, NotionConfig};
pub use page::{Page, PageRef};
pub use properties::{Block, Properties, PropertyValue, TextSegment};
pub use store::{DocumentStore, QueryPage, QueryRequest};
pub use writer::{
    ActivityEntry, PersistenceWriter, ResolvedActor, WriteReport, create_with_fallback,
    log_activity,
};

use serde::{Deserialize, Serialize};

/// Database identifiers. Actors, the activity log and briefs have no
/// built-in default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseIds {
    pub sources: String,
    pub events: String,
    pub intel_feeds: String,
    pub score_snapshots: String,
    pub scenarios: String,
    pub actors: Option<String>,
    pub activity_log: Option<String>,
    pub briefs: Option<String>,
}

impl Default for DatabaseIds {
    fn default() -> Self {
        Self {
            sources: "c0e5c418-893f-4138-bc0d-7d046b02323d".to_string(),
            events: "21452f2f-6f38-4a70-8f3b-dabbb7ee81f1".to_string(),
            intel_feeds: "3835cb822ae441a5a18cb4271d9fe955".to_string(),
            score_snapshots: "e96696510cac4435a52e89be9fb6a969".to_string(),
            scenarios: "430eb13962d44154b9761785faf01300".to_string(),
            actors: None,
            activity_log: None,
            briefs: None,
        }
    }
}

impl DatabaseIds {
    pub fn actors(&self) -> Result<&str, StoreError> {
        self.actors.as_deref().ok_or(StoreError::NotConfigured("actors"))
    }

    pub fn briefs(&self) -> Result<&str, StoreError> {
        self.briefs.as_deref().ok_or(StoreError::NotConfigured("briefs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_databases_report_not_configured() {
        let ids = DatabaseIds::default();
        assert!(matches!(ids.actors(), Err(StoreError::NotConfigured("actors"))));
        assert!(matches!(ids.briefs(), Err(StoreError::NotConfigured("briefs"))));

        let ids = DatabaseIds {
            actors: Some("a".into()),
            ..DatabaseIds::default()
        };
        assert_eq!(ids.actors().unwrap(), "a");
    }
}
