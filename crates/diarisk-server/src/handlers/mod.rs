//! HTTP route handlers for the prediction server.

pub mod predict;

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}
