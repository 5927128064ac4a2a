//! In-memory document store for tests and dry runs.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::error::StoreError;
use crate::filter::{Condition, Direction, Filter, Sort};
use crate::page::{Page, PageRef};
use crate::properties::{Block, Properties};
use crate::store::{DocumentStore, QueryPage, QueryRequest};

const DEFAULT_PAGE_SIZE: usize = 100;

/// Pages grouped by database, with optional per-database schemas and
/// failure injection. Data is lost when the store is dropped.
pub struct MemoryStore {
    databases: RwLock<HashMap<String, Vec<Page>>>,
    schemas: RwLock<HashMap<String, HashSet<String>>>,
    failing: RwLock<HashSet<String>>,
    bodies: RwLock<HashMap<String, Vec<Block>>>,
    page_size: usize,
    next_id: RwLock<u64>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            databases: RwLock::new(HashMap::new()),
            schemas: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            bodies: RwLock::new(HashMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
            next_id: RwLock::new(0),
        }
    }

    /// Cap results per query call, forcing callers to paginate.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Restrict `database_id` to the given property names. Writes naming any
    /// other property are rejected as a validation error.
    pub fn with_schema(self, database_id: &str, properties: &[&str]) -> Self {
        self.schemas.write().unwrap().insert(
            database_id.to_string(),
            properties.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    /// Every call touching `database_id` fails with a server error.
    pub fn fail_database(&self, database_id: &str) {
        self.failing.write().unwrap().insert(database_id.to_string());
    }

    /// Seed a page with raw property JSON and an explicit creation time.
    pub fn insert_page(&self, database_id: &str, properties: Value, created_time: &str) -> String {
        let id = self.allocate_id();
        let page = Page {
            id: id.clone(),
            url: None,
            created_time: Some(created_time.to_string()),
            properties: properties.as_object().cloned().unwrap_or_default(),
        };
        self.databases
            .write()
            .unwrap()
            .entry(database_id.to_string())
            .or_default()
            .push(page);
        id
    }

    pub fn pages(&self, database_id: &str) -> Vec<Page> {
        self.databases
            .read()
            .unwrap()
            .get(database_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn page(&self, page_id: &str) -> Option<Page> {
        self.databases
            .read()
            .unwrap()
            .values()
            .flatten()
            .find(|p| p.id == page_id)
            .cloned()
    }

    pub fn body(&self, page_id: &str) -> Vec<Block> {
        self.bodies
            .read()
            .unwrap()
            .get(page_id)
            .cloned()
            .unwrap_or_default()
    }

    fn allocate_id(&self) -> String {
        let mut next = self.next_id.write().unwrap();
        *next += 1;
        format!("00000000-0000-4000-8000-{:012x}", *next)
    }

    fn check_available(&self, database_id: &str) -> Result<(), StoreError> {
        if self.failing.read().unwrap().contains(database_id) {
            return Err(StoreError::api(
                500,
                "internal_server_error",
                format!("database {database_id} unavailable"),
            ));
        }
        Ok(())
    }

    fn check_schema(&self, database_id: &str, properties: &Properties) -> Result<(), StoreError> {
        let schemas = self.schemas.read().unwrap();
        let Some(schema) = schemas.get(database_id) else {
            return Ok(());
        };
        match properties.names().find(|name| !schema.contains(*name)) {
            Some(unknown) => Err(StoreError::api(
                400,
                "validation_error",
                format!("{unknown} is not a property that exists."),
            )),
            None => Ok(()),
        }
    }

    fn database_of(&self, page_id: &str) -> Option<String> {
        self.databases
            .read()
            .unwrap()
            .iter()
            .find(|(_, pages)| pages.iter().any(|p| p.id == page_id))
            .map(|(db, _)| db.clone())
    }
}

fn not_found(page_id: &str) -> StoreError {
    StoreError::api(404, "object_not_found", format!("Could not find page {page_id}"))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(
        &self,
        database_id: &str,
        request: &QueryRequest,
    ) -> Result<QueryPage, StoreError> {
        self.check_available(database_id)?;

        let mut matching: Vec<Page> = self
            .pages(database_id)
            .into_iter()
            .filter(|page| request.filter.as_ref().is_none_or(|f| matches(f, page)))
            .collect();
        for sort in request.sorts.iter().rev() {
            matching.sort_by(|a, b| compare(sort, a, b));
        }

        let start = match &request.start_cursor {
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| StoreError::api(400, "validation_error", "invalid start_cursor"))?,
            None => 0,
        };
        let size = request
            .page_size
            .map(|s| s as usize)
            .unwrap_or(self.page_size)
            .min(self.page_size)
            .max(1);
        let end = (start + size).min(matching.len());
        let has_more = end < matching.len();

        Ok(QueryPage {
            results: matching.get(start..end).map(<[Page]>::to_vec).unwrap_or_default(),
            has_more,
            next_cursor: has_more.then(|| end.to_string()),
        })
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: &Properties,
        children: &[Block],
    ) -> Result<PageRef, StoreError> {
        self.check_available(database_id)?;
        self.check_schema(database_id, properties)?;

        let created = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let id = self.insert_page(database_id, Value::Object(properties.to_json()), &created);
        if !children.is_empty() {
            self.bodies
                .write()
                .unwrap()
                .insert(id.clone(), children.to_vec());
        }
        Ok(PageRef::new(id, None))
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: &Properties,
    ) -> Result<PageRef, StoreError> {
        let database_id = self.database_of(page_id).ok_or_else(|| not_found(page_id))?;
        self.check_available(&database_id)?;
        self.check_schema(&database_id, properties)?;

        let mut databases = self.databases.write().unwrap();
        let page = databases
            .get_mut(&database_id)
            .and_then(|pages| pages.iter_mut().find(|p| p.id == page_id))
            .ok_or_else(|| not_found(page_id))?;
        page.properties.extend(properties.to_json());
        Ok(PageRef::from(&*page))
    }

    async fn retrieve_page(&self, page_id: &str) -> Result<Page, StoreError> {
        let database_id = self.database_of(page_id).ok_or_else(|| not_found(page_id))?;
        self.check_available(&database_id)?;
        self.page(page_id).ok_or_else(|| not_found(page_id))
    }
}

fn matches(filter: &Filter, page: &Page) -> bool {
    match filter {
        Filter::And(filters) => filters.iter().all(|f| matches(f, page)),
        Filter::Or(filters) => filters.iter().any(|f| matches(f, page)),
        Filter::CreatedOnOrAfter(ts) => page
            .created_time
            .as_deref()
            .is_some_and(|created| timestamp_on_or_after(created, ts)),
        Filter::Property {
            property,
            condition,
        } => match condition {
            Condition::TitleEquals(value) => page.text(property) == *value,
            Condition::SelectEquals(value) => page.select(property).as_deref() == Some(value),
            Condition::RelationContains(id) => page.relation_ids(property).contains(id),
            Condition::NumberIsNotEmpty => page.number(property).is_some(),
            Condition::DateOnOrAfter(date) => page
                .date(property)
                .is_some_and(|d| d.as_str() >= date.as_str()),
        },
    }
}

fn timestamp_on_or_after(created: &str, cutoff: &str) -> bool {
    match (
        chrono::DateTime::parse_from_rfc3339(created),
        chrono::DateTime::parse_from_rfc3339(cutoff),
    ) {
        (Ok(created), Ok(cutoff)) => created >= cutoff,
        _ => created >= cutoff,
    }
}

fn compare(sort: &Sort, a: &Page, b: &Page) -> Ordering {
    let (ordering, direction) = match sort {
        Sort::CreatedTime(direction) => (a.created_time.cmp(&b.created_time), *direction),
        Sort::Property {
            property,
            direction,
        } => (
            sort_key(a.property(property)).cmp_values(&sort_key(b.property(property))),
            *direction,
        ),
    };
    match direction {
        Direction::Ascending => ordering,
        Direction::Descending => ordering.reverse(),
    }
}

enum SortKey {
    Number(f64),
    Text(String),
    Empty,
}

impl SortKey {
    /// Empty values sort last in ascending order.
    fn cmp_values(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Empty, SortKey::Empty) => Ordering::Equal,
            (SortKey::Empty, _) => Ordering::Greater,
            (_, SortKey::Empty) => Ordering::Less,
            (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
        }
    }
}

fn sort_key(property: Option<&Value>) -> SortKey {
    let Some(property) = property.and_then(Value::as_object) else {
        return SortKey::Empty;
    };
    if let Some(n) = property.get("number").and_then(Value::as_f64) {
        return SortKey::Number(n);
    }
    let text = property
        .get("select")
        .and_then(|s| s.get("name"))
        .or_else(|| property.get("date").and_then(|d| d.get("start")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| crate::page::plain_text(&Value::Object(property.clone())));
    if text.is_empty() {
        SortKey::Empty
    } else {
        SortKey::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_query_all_follows_cursors() {
        let store = MemoryStore::new().with_page_size(2);
        for i in 0..5 {
            store.insert_page("db", json!({"Name": {"title": [{"plain_text": format!("p{i}")}]}}), "2026-01-01T00:00:00Z");
        }

        let first = store.query("db", &QueryRequest::default()).await.unwrap();
        assert_eq!(first.results.len(), 2);
        assert!(first.has_more);

        let all = store.query_all("db", &QueryRequest::default()).await.unwrap();
        let names: Vec<String> = all.iter().map(|p| p.text("Name")).collect();
        assert_eq!(names, vec!["p0", "p1", "p2", "p3", "p4"]);
    }

    #[tokio::test]
    async fn test_schema_rejects_unknown_property() {
        let store = MemoryStore::new().with_schema("sources", &["Title"]);
        let props = Properties::new().title("Title", "T").rich_text("Summary", "S");
        let err = store.create_page("sources", &props, &[]).await.unwrap_err();
        assert!(err.is_validation());

        let core = props.subset(&["Title"]);
        assert!(store.create_page("sources", &core, &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_filters_and_sorts() {
        let store = MemoryStore::new();
        store.insert_page("s", json!({"Status": {"select": {"name": "Active"}}, "Probability Estimate": {"select": {"name": "Low"}}}), "2026-01-01T00:00:00Z");
        store.insert_page("s", json!({"Status": {"select": {"name": "Retired"}}}), "2026-01-02T00:00:00Z");
        store.insert_page("s", json!({"Status": {"select": {"name": "Active"}}, "Probability Estimate": {"select": {"name": "High"}}}), "2026-01-03T00:00:00Z");

        let request = QueryRequest::filtered(Filter::select_equals("Status", "Active"))
            .sorted_by(Sort::property("Probability Estimate", Direction::Ascending));
        let pages = store.query_all("s", &request).await.unwrap();
        let probabilities: Vec<Option<String>> =
            pages.iter().map(|p| p.select("Probability Estimate")).collect();
        assert_eq!(probabilities, vec![Some("High".into()), Some("Low".into())]);

        let recent = QueryRequest::filtered(Filter::CreatedOnOrAfter("2026-01-02T00:00:00+00:00".into()))
            .sorted_by(Sort::CreatedTime(Direction::Descending));
        let pages = store.query_all("s", &recent).await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].created_time.as_deref(), Some("2026-01-03T00:00:00Z"));
    }

    #[tokio::test]
    async fn test_update_merges_and_missing_page_is_404() {
        let store = MemoryStore::new();
        let id = store.insert_page("a", json!({"Name": {"title": [{"plain_text": "Niger"}]}}), "2026-01-01T00:00:00Z");

        store
            .update_page(&id, &Properties::new().number("Authority Score", 40))
            .await
            .unwrap();
        let page = store.retrieve_page(&id).await.unwrap();
        assert_eq!(page.text("Name"), "Niger");
        assert_eq!(page.number("Authority Score"), Some(40.0));

        let err = store.retrieve_page("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failing_database() {
        let store = MemoryStore::new();
        store.fail_database("log");
        let err = store
            .create_page("log", &Properties::new().title("Log Title", "x"), &[])
            .await
            .unwrap_err();
        assert!(!err.is_validation());
    }
}
