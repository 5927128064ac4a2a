//! HTTP surface over the pipeline.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use brief::{BriefError, DEFAULT_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS};
use extract::{ExtractError, ScreeningResult};
use index::StoreError;
use ingest::{IngestError, document_hash};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::cache::{CacheStats, ScreeningCache};
use crate::config::DEFAULT_MAX_UPLOAD_MB;
use crate::metrics::{Metrics, MetricsSnapshot, TimedOperation};
use crate::pipeline::{BriefReport, IngestReport, Pipeline};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub cache: ScreeningCache,
    pub metrics: Arc<Metrics>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: Pipeline, cache: ScreeningCache) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            cache,
            metrics: Metrics::new(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

pub fn router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);
    Router::new()
        .route("/health", get(health_check))
        .route("/screen", post(screen_document))
        .route("/ingest/text", post(ingest_text))
        .route("/ingest/:document_id", post(ingest_screened))
        .route("/score", post(score_actors))
        .route("/brief", post(generate_brief))
        .route("/stats", get(get_stats))
        .with_state(state)
        .layer(upload_limit)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "http_request",
                request_id = %Uuid::new_v4(),
                method = %request.method(),
                path = %request.uri().path(),
            )
        }))
}

/// An error response: status plus a JSON `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        err if err.is_not_found() => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let status = if err.downcast_ref::<IngestError>().is_some() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else if let Some(extract) = err.downcast_ref::<ExtractError>() {
            if extract.is_input() {
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                StatusCode::BAD_GATEWAY
            }
        } else if let Some(store) = err.downcast_ref::<StoreError>() {
            store_status(store)
        } else if let Some(brief) = err.downcast_ref::<BriefError>() {
            match brief {
                BriefError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                BriefError::Store(store) => store_status(store),
                BriefError::Generation(_) => StatusCode::BAD_GATEWAY,
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            error!(error = %format!("{err:#}"), "request failed");
        }
        Self::new(status, format!("{err:#}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn recorded<T>(state: &AppState, result: Result<T, ApiError>) -> Result<T, ApiError> {
    state.metrics.record_request(result.is_ok());
    result
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
pub struct ScreenParams {
    filename: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ScreenResponse {
    pub document_id: String,
    pub result: ScreeningResult,
    pub cached: bool,
}

/// Screen a raw PDF body. Identical uploads are answered from the cache.
async fn screen_document(
    State(state): State<AppState>,
    Query(params): Query<ScreenParams>,
    body: Bytes,
) -> Result<Json<ScreenResponse>, ApiError> {
    let result = async {
        if body.is_empty() {
            return Err(ApiError::new(StatusCode::BAD_REQUEST, "request body must be a PDF"));
        }
        let document_id = document_hash(&body);
        if let Some(screened) = state.cache.get(&document_id) {
            return Ok(ScreenResponse {
                document_id,
                result: screened.result,
                cached: true,
            });
        }

        let timer = TimedOperation::start();
        let source = params.filename.as_deref().unwrap_or("upload.pdf");
        let screened = state.pipeline.screen_pdf(&body, source).await?;
        state.metrics.record_screen(timer.elapsed());

        let response = ScreenResponse {
            document_id: screened.document.doc_id.clone(),
            result: screened.result.clone(),
            cached: false,
        };
        state.cache.insert(screened);
        Ok::<_, ApiError>(response)
    }
    .await;
    recorded(&state, result).map(Json)
}

/// Approve a previously screened document for ingestion.
async fn ingest_screened(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<Json<IngestReport>, ApiError> {
    let result = async {
        let screened = state.cache.get(&document_id).ok_or_else(|| {
            ApiError::new(
                StatusCode::NOT_FOUND,
                format!("no screened document {document_id}; screen it first"),
            )
        })?;

        let timer = TimedOperation::start();
        let report = state
            .pipeline
            .ingest(&screened.document.text, None, &screened.result)
            .await?;
        state.metrics.record_ingest(timer.elapsed());
        record_scores(&state, &report.scores);
        state.cache.remove(&document_id);
        info!(document_id = %document_id, "screened document ingested");
        Ok::<_, ApiError>(report)
    }
    .await;
    recorded(&state, result).map(Json)
}

#[derive(Deserialize)]
pub struct ManualIngestRequest {
    pub text: Option<String>,
    pub url: Option<String>,
}

async fn ingest_text(
    State(state): State<AppState>,
    Json(request): Json<ManualIngestRequest>,
) -> Result<Json<IngestReport>, ApiError> {
    let result = async {
        let text = request.text.as_deref().filter(|t| !t.trim().is_empty());
        let url = request.url.as_deref().filter(|u| !u.trim().is_empty());
        if text.is_none() && url.is_none() {
            return Err(ApiError::new(StatusCode::BAD_REQUEST, "either text or url is required"));
        }

        let timer = TimedOperation::start();
        let report = state.pipeline.ingest_manual(text, url).await?;
        state.metrics.record_ingest(timer.elapsed());
        record_scores(&state, &report.scores);
        Ok::<_, ApiError>(report)
    }
    .await;
    recorded(&state, result).map(Json)
}

fn record_scores(state: &AppState, scores: &[score::ScoreOutcome]) {
    let succeeded = scores.iter().filter(|s| s.success).count();
    state.metrics.record_scores(succeeded, scores.len() - succeeded);
}

#[derive(Deserialize)]
pub struct ScoreRequest {
    pub actor_ids: Vec<String>,
}

async fn score_actors(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<Vec<score::ScoreOutcome>>, ApiError> {
    let result = async {
        if request.actor_ids.is_empty() {
            return Err(ApiError::new(StatusCode::BAD_REQUEST, "actor_ids must not be empty"));
        }
        let outcomes = state.pipeline.score(&request.actor_ids).await;
        record_scores(&state, &outcomes);
        Ok::<_, ApiError>(outcomes)
    }
    .await;
    recorded(&state, result).map(Json)
}

#[derive(Deserialize, Default)]
pub struct BriefRequest {
    pub lookback_days: Option<u32>,
    pub priority: Option<String>,
    #[serde(default)]
    pub save: bool,
}

async fn generate_brief(
    State(state): State<AppState>,
    Json(request): Json<BriefRequest>,
) -> Result<Json<BriefReport>, ApiError> {
    let result = async {
        let lookback_days = request.lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS);
        if !(1..=MAX_LOOKBACK_DAYS).contains(&lookback_days) {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                format!("lookback_days must be between 1 and {MAX_LOOKBACK_DAYS}"),
            ));
        }
        let report = state
            .pipeline
            .brief(
                lookback_days,
                request.priority.as_deref().unwrap_or_default(),
                request.save,
            )
            .await?;
        state.metrics.record_brief();
        Ok::<_, ApiError>(report)
    }
    .await;
    recorded(&state, result).map(Json)
}

#[derive(Serialize)]
struct StatsResponse {
    metrics: MetricsSnapshot,
    cache: CacheStats,
}

async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        metrics: state.metrics.snapshot(),
        cache: state.cache.stats(),
    })
}
