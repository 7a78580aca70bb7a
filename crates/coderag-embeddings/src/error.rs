//! Errors for the embedding client.
//!
//! Per spec.md §7, transient/permanent remote failures never propagate as
//! an error to the caller of `embed`/`chat` — they fall back to a zero
//! vector or apology string instead. `EmbeddingError` exists for the
//! internal retry loop's own bookkeeping and for `is_healthy`'s probe.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("request to model server timed out")]
    Timeout,

    #[error("connection to model server failed: {0}")]
    Connection(String),

    #[error("model server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model server returned an empty response body")]
    EmptyResponse,
}

pub type EmbeddingResult<T> = std::result::Result<T, EmbeddingError>;
