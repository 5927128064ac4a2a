use dashmap::DashMap;
use extract::ScreenedDocument;
use serde::Serialize;
use std::sync::Arc;

/// Screened documents awaiting ingestion, keyed by document hash. Lets an
/// approval request skip re-screening within one server process.
#[derive(Clone)]
pub struct ScreeningCache {
    entries: Arc<DashMap<String, ScreenedDocument>>,
    max_entries: usize,
}

impl ScreeningCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_entries,
        }
    }

    pub fn insert(&self, screened: ScreenedDocument) {
        if self.max_entries == 0 {
            return;
        }
        if self.entries.len() >= self.max_entries {
            // Simple eviction: clear a quarter when full
            let to_remove: Vec<_> = self
                .entries
                .iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.entries.remove(&key);
            }
        }
        self.entries.insert(screened.document.doc_id.clone(), screened);
    }

    pub fn get(&self, document_id: &str) -> Option<ScreenedDocument> {
        self.entries.get(document_id).map(|r| r.value().clone())
    }

    pub fn remove(&self, document_id: &str) -> Option<ScreenedDocument> {
        self.entries.remove(document_id).map(|(_, screened)| screened)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            documents_cached: self.entries.len(),
            max_entries: self.max_entries,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub documents_cached: usize,
    pub max_entries: usize,
}
