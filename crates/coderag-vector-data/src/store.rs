//! The `VectorStore` capability (spec.md §4.5).

use crate::error::VectorDataResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coderag_parsing::{Chunk, SearchResult};

/// Holds chunks + embeddings; supports upsert, cosine top-k, per-file
/// delete, per-file last-modified lookup, and file enumeration.
///
/// Implementations must give exclusive-writer/multi-reader discipline: a
/// reader must never observe a torn write (spec.md §5 "Shared resources").
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace chunks by `id`.
    async fn upsert(&self, chunks: Vec<Chunk>) -> VectorDataResult<()>;

    /// Brute-force cosine top-k over every chunk with a non-null
    /// embedding, sorted descending, truncated to `limit`.
    async fn search(&self, query: &[f32], limit: usize) -> VectorDataResult<Vec<SearchResult>>;

    /// Total chunk count.
    async fn count(&self) -> VectorDataResult<usize>;

    /// Remove every chunk.
    async fn clear(&self) -> VectorDataResult<()>;

    /// Every distinct `file_path` currently represented in the store.
    async fn all_files(&self) -> VectorDataResult<Vec<String>>;

    /// `last_modified` of the first chunk found with this `file_path`, or
    /// `None` if the file has no chunks in the store.
    async fn last_modified(&self, file_path: &str) -> VectorDataResult<Option<DateTime<Utc>>>;

    /// Remove every chunk belonging to `file_path`.
    async fn delete_file_chunks(&self, file_path: &str) -> VectorDataResult<()>;
}

/// `dot(a, b) / (||a|| * ||b||)`. Zero when either vector has zero norm —
/// never an error (spec.md §4.5).
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
