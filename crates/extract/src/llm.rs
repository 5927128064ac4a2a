use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ExtractError, LlmError};
use crate::response::parse_json_object;

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Model name and output budget for one kind of call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub model: String,
    pub max_tokens: u32,
}

impl ModelSettings {
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            max_tokens,
        }
    }
}

/// A single-turn generation: system text plus one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    /// Mark the system text as a prompt-cache breakpoint.
    pub cache_system: bool,
    pub user: String,
}

impl GenerationRequest {
    pub fn new(settings: &ModelSettings, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            system: system.into(),
            cache_system: false,
            user: user.into(),
        }
    }

    pub fn cached(mut self) -> Self {
        self.cache_system = true;
        self
    }

    /// Same request with `suffix` appended to the system text.
    pub fn with_system_suffix(&self, suffix: &str) -> Self {
        let mut request = self.clone();
        request.system.push_str(suffix);
        request
    }
}

/// Text in, raw text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: ANTHROPIC_API_URL.to_string(),
            timeout_secs: 60,
        }
    }
}

// Wire types for the Messages API.

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: Vec<SystemBlock<'a>>,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct SystemBlock<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_control: Option<CacheControl>,
}

#[derive(Serialize)]
struct CacheControl {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ResponseBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl<'a> MessagesRequest<'a> {
    fn from_request(request: &'a GenerationRequest) -> Self {
        Self {
            model: &request.model,
            max_tokens: request.max_tokens,
            system: vec![SystemBlock {
                kind: "text",
                text: &request.system,
                cache_control: request
                    .cache_system
                    .then_some(CacheControl { kind: "ephemeral" }),
            }],
            messages: vec![WireMessage {
                role: "user",
                content: &request.user,
            }],
        }
    }
}

/// Anthropic Messages API client.
#[derive(Clone)]
pub struct AnthropicClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key).map_err(|_| LlmError::Api {
            status: 0,
            body: "API key is not a valid header value".to_string(),
        })?;
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let url = format!("{}/messages", self.base_url);
        debug!(model = %request.model, max_tokens = request.max_tokens, "messages request");

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&MessagesRequest::from_request(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let body: MessagesResponse = response.json().await?;
        first_text(body)
    }
}

fn first_text(response: MessagesResponse) -> Result<String, LlmError> {
    response
        .content
        .into_iter()
        .find_map(|block| match block {
            ResponseBlock::Text { text } => Some(text.trim().to_string()),
            ResponseBlock::Other => None,
        })
        .ok_or(LlmError::EmptyResponse)
}

/// Generate, parse the JSON object and validate it.
///
/// A malformed body earns exactly one retry with `strict_suffix` appended to
/// the system text. Transport errors and `validate` errors are returned as-is.
pub async fn generate_json_with_retry<T, F>(
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
    strict_suffix: &str,
    validate: F,
) -> Result<T, ExtractError>
where
    F: FnOnce(Map<String, Value>) -> Result<T, ExtractError>,
{
    let first = generator.generate(request).await?;
    let parsed = match parse_json_object(&first) {
        Ok(parsed) => parsed,
        Err(err) if err.is_retryable_parse() => {
            warn!(error = %err, "malformed JSON from model, retrying with stricter prompt");
            let second = generator
                .generate(&request.with_system_suffix(strict_suffix))
                .await?;
            parse_json_object(&second)
                .map_err(|_| ExtractError::RetryExhausted { first, second })?
        }
        Err(err) => return Err(err),
    };

    validate(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;

    fn request() -> GenerationRequest {
        GenerationRequest::new(&ModelSettings::new("test-model", 256), "SYSTEM", "user text").cached()
    }

    #[test]
    fn test_wire_request_marks_cacheable_system() {
        let request = request();
        let wire = serde_json::to_value(MessagesRequest::from_request(&request)).unwrap();
        assert_eq!(wire["model"], "test-model");
        assert_eq!(wire["max_tokens"], 256);
        assert_eq!(wire["system"][0]["text"], "SYSTEM");
        assert_eq!(wire["system"][0]["cache_control"]["type"], "ephemeral");
        assert_eq!(wire["messages"][0]["role"], "user");
        assert_eq!(wire["messages"][0]["content"], "user text");

        let plain = GenerationRequest::new(&ModelSettings::new("m", 1), "s", "u");
        let wire = serde_json::to_value(MessagesRequest::from_request(&plain)).unwrap();
        assert!(wire["system"][0].get("cache_control").is_none());
    }

    #[test]
    fn test_first_text_block_is_returned() {
        let body: MessagesResponse = serde_json::from_str(
            r#"{"content": [{"type": "thinking", "thinking": "..."}, {"type": "text", "text": "  {\"a\": 1}\n"}]}"#,
        )
        .unwrap();
        assert_eq!(first_text(body).unwrap(), "{\"a\": 1}");

        let empty: MessagesResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert!(matches!(first_text(empty), Err(LlmError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_valid_first_response_needs_one_call() {
        let generator = ScriptedGenerator::new(["{\"ok\": true}"]);
        let value = generate_json_with_retry(&generator, &request(), " STRICT", |map| Ok(map))
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(generator.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_then_valid_retries_with_suffix() {
        let generator = ScriptedGenerator::new(["not json at all", "{\"ok\": 1}"]);
        let value = generate_json_with_retry(&generator, &request(), " STRICT", |map| Ok(map))
            .await
            .unwrap();
        assert_eq!(value["ok"], 1);

        let calls = generator.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].system, "SYSTEM");
        assert_eq!(calls[1].system, "SYSTEM STRICT");
        assert_eq!(calls[1].user, calls[0].user);
    }

    #[tokio::test]
    async fn test_two_malformed_responses_carry_both_bodies() {
        let generator = ScriptedGenerator::new(["first garbage", "second garbage"]);
        let err = generate_json_with_retry(&generator, &request(), " STRICT", |map| Ok(map))
            .await
            .unwrap_err();
        match err {
            ExtractError::RetryExhausted { first, second } => {
                assert_eq!(first, "first garbage");
                assert_eq!(second, "second garbage");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_validation_errors_are_not_retried() {
        let generator = ScriptedGenerator::new(["{\"authority_score\": 150}", "{}"]);
        let err = generate_json_with_retry(&generator, &request(), " STRICT", |_| {
            Err::<(), _>(ExtractError::validation("authority_score", "out of range"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ExtractError::Validation { .. }));
        assert_eq!(generator.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let generator = ScriptedGenerator::failing(503);
        let err = generate_json_with_retry(&generator, &request(), " STRICT", |map| Ok(map))
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(generator.calls().len(), 1);
    }
}
