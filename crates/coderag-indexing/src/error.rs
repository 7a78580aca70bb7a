//! Errors for the indexer. Per spec.md §7, the job never throws to its
//! caller — this enum exists for the one boundary check that *is* fatal:
//! a nonexistent root directory.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("root path does not exist: {0}")]
    RootNotFound(String),

    #[error("root path is not a directory: {0}")]
    NotADirectory(String),
}

pub type IndexerResult<T> = std::result::Result<T, IndexerError>;
