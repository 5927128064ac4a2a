use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::page::{Page, PageRef};
use crate::properties::{Block, Properties};
use crate::store::{DocumentStore, QueryPage, QueryRequest};

pub const NOTION_API_URL: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";

const RETRIEVE_TIMEOUT: Duration = Duration::from_secs(10);
const QUERY_TIMEOUT: Duration = Duration::from_secs(20);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub base_url: String,
    pub version: String,
}

impl NotionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: NOTION_API_URL.to_string(),
            version: NOTION_VERSION.to_string(),
        }
    }
}

/// Error body returned by the API on non-2xx responses.
#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct NotionClient {
    base_url: String,
    headers: HeaderMap,
    client: reqwest::Client,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| StoreError::Decode("API key is not a valid header value".into()))?;
        let version = HeaderValue::from_str(&config.version)
            .map_err(|_| StoreError::Decode("invalid API version header".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Notion-Version", version);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers,
            client: reqwest::Client::new(),
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, StoreError> {
        let response = request.headers(self.headers.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or(ApiErrorBody {
                code: String::new(),
                message: text,
            });
            warn!(status = status.as_u16(), code = %body.code, "document store error");
            return Err(StoreError::api(status.as_u16(), body.code, body.message));
        }

        Ok(response.json().await?)
    }

    fn page_ref(value: Value) -> Result<PageRef, StoreError> {
        let page: Page =
            serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(PageRef::from(&page))
    }
}

#[async_trait]
impl DocumentStore for NotionClient {
    async fn query(
        &self,
        database_id: &str,
        request: &QueryRequest,
    ) -> Result<QueryPage, StoreError> {
        let url = format!("{}/databases/{}/query", self.base_url, database_id);
        debug!(database_id, cursor = ?request.start_cursor, "querying database");

        let body = self
            .send(
                self.client
                    .post(&url)
                    .timeout(QUERY_TIMEOUT)
                    .json(&request.to_json()),
            )
            .await?;
        serde_json::from_value(body).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: &Properties,
        children: &[Block],
    ) -> Result<PageRef, StoreError> {
        let url = format!("{}/pages", self.base_url);
        let mut payload = json!({
            "parent": { "database_id": database_id },
            "properties": properties.to_json(),
        });
        if !children.is_empty() {
            payload["children"] = Value::Array(children.iter().map(Block::to_json).collect());
        }

        let body = self
            .send(self.client.post(&url).timeout(WRITE_TIMEOUT).json(&payload))
            .await?;
        Self::page_ref(body)
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: &Properties,
    ) -> Result<PageRef, StoreError> {
        let url = format!("{}/pages/{}", self.base_url, page_id);
        let payload = json!({ "properties": properties.to_json() });

        let body = self
            .send(self.client.patch(&url).timeout(WRITE_TIMEOUT).json(&payload))
            .await?;
        Self::page_ref(body)
    }

    async fn retrieve_page(&self, page_id: &str) -> Result<Page, StoreError> {
        let url = format!("{}/pages/{}", self.base_url, page_id);
        let body = self
            .send(self.client.get(&url).timeout(RETRIEVE_TIMEOUT))
            .await?;
        serde_json::from_value(body).map_err(|e| StoreError::Decode(e.to_string()))
    }
}
