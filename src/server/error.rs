//! HTTP error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::types::responses::HealthReport;
use crate::CaptionError;

/// Error returned by a handler, rendered as `{"detail": ..}`.
#[derive(Debug)]
pub enum ApiError {
    /// Request body failed validation (422).
    Validation(String),
    /// A shared resource is not usable (503).
    Unavailable(String),
    /// Health probe failed (503).
    Unhealthy(HealthReport),
    /// Anything else (500).
    Internal(String),
}

impl From<CaptionError> for ApiError {
    fn from(err: CaptionError) -> Self {
        match err {
            CaptionError::InvalidRequest(msg) => ApiError::Validation(msg),
            CaptionError::Unavailable(_) => ApiError::Unavailable(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, json!(msg)),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, json!(msg)),
            ApiError::Unhealthy(report) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({"status": "unhealthy", "details": report}),
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!(msg))
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
