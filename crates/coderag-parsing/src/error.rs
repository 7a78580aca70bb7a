//! Error types for project detection, chunking, and crawling.

use thiserror::Error;

/// Errors surfaced by `coderag-parsing`.
///
/// Per the design's error-handling policy, these are all recoverable at the
/// call site: a parse failure or unreadable file is logged and the caller
/// falls back to an empty chunk list rather than aborting the crawl.
#[derive(Debug, Error)]
pub enum ParsingError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path} with tree-sitter: {reason}")]
    TreeSitter { path: String, reason: String },

    #[error("file too large: {path} ({size} bytes, limit {limit} bytes)")]
    TooLarge {
        path: String,
        size: u64,
        limit: u64,
    },
}

pub type ParsingResult<T> = std::result::Result<T, ParsingError>;
