use anyhow::{Context, Result};
use api::{AppConfig, AppState, Pipeline, ScreeningCache, router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let pipeline = Pipeline::from_config(&config)?;

    let max_entries = if config.cache.enabled {
        config.cache.max_entries
    } else {
        0
    };
    let state = AppState::new(pipeline, ScreeningCache::new(max_entries))
        .with_max_upload_bytes(config.server.max_upload_bytes);
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, cache = config.cache.enabled, "server running");
    axum::serve(listener, app).await?;
    Ok(())
}
