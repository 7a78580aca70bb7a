//! Errors for the vector store (spec.md §4.5).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorDataError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type VectorDataResult<T> = std::result::Result<T, VectorDataError>;
