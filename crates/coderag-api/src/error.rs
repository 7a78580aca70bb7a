//! HTTP-facing error type for the `coderag-api` binary (spec.md §7: "User-visible
//! failure always manifests through `IndexingStatus.message` or a chat reply —
//! never as an unhandled exception crossing a boundary").
//!
//! This is the one place in the workspace where a thrown error becomes an HTTP
//! response, so it is also the one place that sanitizes messages before they
//! leave the process (`coderag_common::error_sanitizer`).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(msg) => {
                let sanitized = coderag_common::error_sanitizer::sanitize_error(msg, "api_request");
                (StatusCode::INTERNAL_SERVER_ERROR, sanitized)
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
