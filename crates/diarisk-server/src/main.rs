use std::sync::Arc;

use anyhow::{Context, Result};
use diarisk_config::ServerConfig;
use diarisk_server::{router, ServerState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    info!(
        model = %config.model_path.display(),
        encoder = %config.encoder_path.display(),
        mode = %config.response_mode,
        "Loading artifacts"
    );

    let state = ServerState::load(&config).context("failed to load model artifacts")?;
    let app = router(Arc::new(state));

    info!("Starting server on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
