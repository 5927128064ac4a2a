use anyhow::{Context, Result};
use extract::{LlmConfig, ModelSettings};
use index::{DatabaseIds, NotionConfig};
use serde::{Deserialize, Serialize};
use std::env;

pub const EXTRACTION_MODEL: &str = "claude-haiku-4-5-20251001";
pub const SCREENER_MODEL: &str = "claude-sonnet-4-5";
pub const SCORE_MODEL: &str = "claude-sonnet-4-5";
pub const BRIEF_MODEL: &str = "claude-opus-4-6";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub extraction: ModelSettings,
    pub screener: ModelSettings,
    pub score: ModelSettings,
    pub brief: ModelSettings,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            extraction: ModelSettings::new(EXTRACTION_MODEL, 1024),
            screener: ModelSettings::new(SCREENER_MODEL, 1024),
            score: ModelSettings::new(SCORE_MODEL, 1024),
            brief: ModelSettings::new(BRIEF_MODEL, 2500),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

/// Upload cap for `POST /screen` unless `MAX_UPLOAD_MB` says otherwise.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

/// Everything the binaries need, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub notion: NotionConfig,
    pub databases: DatabaseIds,
    pub models: ModelConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load from the process environment, after reading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut llm = LlmConfig::new(get("ANTHROPIC_API_KEY").context("ANTHROPIC_API_KEY must be set")?);
        if let Some(timeout) = get("LLM_TIMEOUT_SECS") {
            llm.timeout_secs = timeout.parse().context("LLM_TIMEOUT_SECS must be a number")?;
        }
        let notion = NotionConfig::new(get("NOTION_API_KEY").context("NOTION_API_KEY must be set")?);

        let defaults = DatabaseIds::default();
        let databases = DatabaseIds {
            sources: get("NOTION_SOURCES_DB_ID").unwrap_or(defaults.sources),
            events: get("NOTION_EVENTS_DB_ID").unwrap_or(defaults.events),
            intel_feeds: get("NOTION_INTEL_FEEDS_DB_ID").unwrap_or(defaults.intel_feeds),
            score_snapshots: get("NOTION_SCORE_SNAPSHOTS_DB_ID").unwrap_or(defaults.score_snapshots),
            scenarios: get("NOTION_SCENARIOS_DB_ID").unwrap_or(defaults.scenarios),
            actors: get("NOTION_ACTORS_DB_ID"),
            activity_log: get("NOTION_ACTIVITY_LOG_DB_ID"),
            briefs: get("BRIEFS_DB_ID"),
        };

        let mut models = ModelConfig::default();
        if let Some(model) = get("CLAUDE_SCREENER_MODEL") {
            models.screener.model = model;
        }
        if let Some(model) = get("CLAUDE_SCORE_MODEL") {
            models.score.model = model;
        }

        Ok(Self {
            llm,
            notion,
            databases,
            models,
            server: ServerConfig {
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get("PORT")
                    .unwrap_or_else(|| "3000".to_string())
                    .parse()
                    .context("PORT must be a valid number")?,
                max_upload_bytes: get("MAX_UPLOAD_MB")
                    .map(|v| v.parse::<usize>())
                    .transpose()
                    .context("MAX_UPLOAD_MB must be a number")?
                    .unwrap_or(DEFAULT_MAX_UPLOAD_MB)
                    * 1024
                    * 1024,
            },
            cache: CacheConfig {
                enabled: get("SCREENING_CACHE").is_none_or(|v| v != "off"),
                max_entries: get("SCREENING_CACHE_MAX")
                    .map(|v| v.parse())
                    .transpose()
                    .context("SCREENING_CACHE_MAX must be a number")?
                    .unwrap_or(1000),
            },
        })
    }
}
