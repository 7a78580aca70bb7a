//! `MemoryStore` — the reference `VectorStore` (spec.md §4.5).
//!
//! `Arc<Mutex<HashMap<String, Chunk>>>` under a single-writer discipline,
//! with brute-force cosine search over the held chunks — sufficient at the
//! target scale; ANN acceleration is a Non-goal (DESIGN.md).

use crate::error::VectorDataResult;
use crate::store::{VectorStore, cosine_similarity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coderag_parsing::{Chunk, SearchResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory `VectorStore`, keyed by chunk id for upsert-by-id dedup.
///
/// A single `tokio::sync::Mutex` guards the whole map: every public method
/// takes the lock for the duration of its work, so readers never observe a
/// torn write (spec.md §5).
#[derive(Clone, Default)]
pub struct MemoryStore {
    chunks: Arc<Mutex<HashMap<String, Chunk>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn upsert(&self, chunks: Vec<Chunk>) -> VectorDataResult<()> {
        let mut guard = self.chunks.lock().await;
        for chunk in chunks {
            guard.insert(chunk.id.clone(), chunk);
        }
        metrics::counter!("coderag_vector_store_upserts_total").increment(1);
        Ok(())
    }

    async fn search(&self, query: &[f32], limit: usize) -> VectorDataResult<Vec<SearchResult>> {
        let guard = self.chunks.lock().await;
        let mut results: Vec<SearchResult> = guard
            .values()
            .filter_map(|chunk| {
                chunk.embedding.as_ref().map(|embedding| SearchResult {
                    chunk: chunk.clone(),
                    similarity: cosine_similarity(query, embedding),
                })
            })
            .collect();
        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(limit);
        Ok(results)
    }

    async fn count(&self) -> VectorDataResult<usize> {
        Ok(self.chunks.lock().await.len())
    }

    async fn clear(&self) -> VectorDataResult<()> {
        self.chunks.lock().await.clear();
        Ok(())
    }

    async fn all_files(&self) -> VectorDataResult<Vec<String>> {
        let guard = self.chunks.lock().await;
        let mut files: Vec<String> = guard
            .values()
            .map(|chunk| chunk.file_path.clone())
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();
        files.sort();
        Ok(files)
    }

    async fn last_modified(&self, file_path: &str) -> VectorDataResult<Option<DateTime<Utc>>> {
        let guard = self.chunks.lock().await;
        Ok(guard
            .values()
            .find(|chunk| chunk.file_path == file_path)
            .map(|chunk| chunk.last_modified))
    }

    async fn delete_file_chunks(&self, file_path: &str) -> VectorDataResult<()> {
        let mut guard = self.chunks.lock().await;
        guard.retain(|_, chunk| chunk.file_path != file_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn chunk_with_embedding(file_path: &str, start: usize, end: usize, embedding: Vec<f32>) -> Chunk {
        let mut chunk = Chunk::new(file_path, "content", start, end, Utc::now(), "text", vec![]);
        chunk.embedding = Some(embedding);
        chunk
    }

    #[tokio::test]
    async fn upsert_dedups_by_id() {
        let store = MemoryStore::new();
        let a = chunk_with_embedding("f.cs", 1, 5, vec![1.0, 0.0]);
        let a_again = chunk_with_embedding("f.cs", 1, 5, vec![0.0, 1.0]);
        store.upsert(vec![a]).await.unwrap();
        store.upsert(vec![a_again]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn search_sorts_descending_and_truncates() {
        let store = MemoryStore::new();
        store
            .upsert(vec![
                chunk_with_embedding("a.cs", 1, 1, vec![1.0, 0.0]),
                chunk_with_embedding("b.cs", 1, 1, vec![0.0, 1.0]),
                chunk_with_embedding("c.cs", 1, 1, vec![0.9, 0.1]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].similarity >= results[1].similarity);
        assert_eq!(results[0].chunk.file_path, "a.cs");
    }

    #[tokio::test]
    async fn delete_file_chunks_removes_only_that_file() {
        let store = MemoryStore::new();
        store
            .upsert(vec![
                chunk_with_embedding("a.cs", 1, 1, vec![1.0]),
                chunk_with_embedding("b.cs", 1, 1, vec![1.0]),
            ])
            .await
            .unwrap();
        store.delete_file_chunks("a.cs").await.unwrap();
        let files = store.all_files().await.unwrap();
        assert_eq!(files, vec!["b.cs".to_string()]);
    }

    #[tokio::test]
    async fn last_modified_returns_none_for_unknown_file() {
        let store = MemoryStore::new();
        assert!(store.last_modified("missing.cs").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_empties_the_store() {
        let store = MemoryStore::new();
        store
            .upsert(vec![chunk_with_embedding("a.cs", 1, 1, vec![1.0])])
            .await
            .unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
