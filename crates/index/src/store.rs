use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::StoreError;
use crate::filter::{Filter, Sort};
use crate::page::{Page, PageRef};
use crate::properties::{Block, Properties};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRequest {
    pub filter: Option<Filter>,
    pub sorts: Vec<Sort>,
    pub start_cursor: Option<String>,
    pub page_size: Option<u32>,
}

impl QueryRequest {
    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            ..Default::default()
        }
    }

    pub fn sorted_by(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        if let Some(filter) = &self.filter {
            body.insert("filter".into(), filter.to_json());
        }
        if !self.sorts.is_empty() {
            body.insert(
                "sorts".into(),
                Value::Array(self.sorts.iter().map(Sort::to_json).collect()),
            );
        }
        if let Some(cursor) = &self.start_cursor {
            body.insert("start_cursor".into(), json!(cursor));
        }
        if let Some(size) = self.page_size {
            body.insert("page_size".into(), json!(size));
        }
        Value::Object(body)
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct QueryPage {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// The hosted document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query(&self, database_id: &str, request: &QueryRequest)
    -> Result<QueryPage, StoreError>;

    async fn create_page(
        &self,
        database_id: &str,
        properties: &Properties,
        children: &[Block],
    ) -> Result<PageRef, StoreError>;

    async fn update_page(&self, page_id: &str, properties: &Properties)
    -> Result<PageRef, StoreError>;

    async fn retrieve_page(&self, page_id: &str) -> Result<Page, StoreError>;

    /// Run `request` and follow cursors until the last page.
    async fn query_all(
        &self,
        database_id: &str,
        request: &QueryRequest,
    ) -> Result<Vec<Page>, StoreError> {
        let mut request = request.clone();
        let mut pages = Vec::new();

        loop {
            let batch = self.query(database_id, &request).await?;
            pages.extend(batch.results);

            match (batch.has_more, batch.next_cursor) {
                (true, Some(cursor)) => request.start_cursor = Some(cursor),
                _ => break,
            }
        }

        debug!(database_id, pages = pages.len(), "query complete");
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Direction;

    #[test]
    fn test_request_body() {
        let request = QueryRequest::filtered(Filter::select_equals("Status", "Active"))
            .sorted_by(Sort::property("Probability Estimate", Direction::Descending))
            .with_page_size(50);
        let body = request.to_json();
        assert_eq!(body["filter"]["select"]["equals"], "Active");
        assert_eq!(body["sorts"][0]["direction"], "descending");
        assert_eq!(body["page_size"], 50);
        assert!(body.get("start_cursor").is_none());

        assert_eq!(QueryRequest::default().to_json(), json!({}));
    }

    #[test]
    fn test_query_page_decodes_api_shape() {
        let page: QueryPage = serde_json::from_value(json!({
            "object": "list",
            "results": [{"object": "page", "id": "p1", "url": "https://www.notion.so/p1",
                         "created_time": "2026-02-27T10:00:00.000Z", "properties": {}}],
            "has_more": true,
            "next_cursor": "c2"
        }))
        .unwrap();
        assert_eq!(page.results[0].id, "p1");
        assert!(page.has_more);
        assert_eq!(page.next_cursor.as_deref(), Some("c2"));
    }
}
