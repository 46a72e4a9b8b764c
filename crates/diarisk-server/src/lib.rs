//! HTTP prediction server for diarisk.
//!
//! Exposes `POST /predict` over a model and encoder loaded once at startup,
//! plus an unlogged `GET /health`.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::routing::{get, post};
use axum::Router;
use diarisk_config::{ResponseMode, ServerConfig};
use diarisk_core::{CategoricalEncoder, Classifier};
use diarisk_model::{load_encoder, load_model, ArtifactError};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

/// Read-only artifacts shared by every request.
pub struct ServerState {
    pub model: Box<dyn Classifier>,
    pub encoder: Box<dyn CategoricalEncoder>,
    pub response_mode: ResponseMode,
}

impl ServerState {
    pub fn new(
        model: impl Classifier + 'static,
        encoder: impl CategoricalEncoder + 'static,
        response_mode: ResponseMode,
    ) -> Self {
        Self {
            model: Box::new(model),
            encoder: Box::new(encoder),
            response_mode,
        }
    }

    /// Loads both artifacts named by `config`.
    pub fn load(config: &ServerConfig) -> Result<Self, ArtifactError> {
        let model = load_model(&config.model_path)?;
        let encoder = load_encoder(&config.encoder_path)?;
        Ok(Self::new(model, encoder, config.response_mode))
    }
}

/// Builds the application router.
pub fn router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                id = %Uuid::new_v4(),
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let logged_routes = Router::new()
        .route("/predict", post(handlers::predict::predict))
        .layer(trace_layer);

    Router::new()
        .merge(logged_routes)
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}
