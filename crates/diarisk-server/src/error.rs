//! Application error types and Axum response conversion.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diarisk_core::InvalidInput;
use serde::Serialize;

/// Request-level errors with HTTP status code mapping.
#[derive(Debug)]
pub enum AppError {
    /// Encoding or inference rejected the record.
    BadRequest(String),
    /// The body could not be read as a patient record.
    Rejected { status: StatusCode, detail: String },
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Rejected { status, .. } => *status,
        }
    }
}

impl From<InvalidInput> for AppError {
    fn from(e: InvalidInput) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match &rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            other => other.status(),
        };
        AppError::Rejected { status, detail: rejection.body_text() }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            AppError::BadRequest(detail) | AppError::Rejected { detail, .. } => detail,
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}
