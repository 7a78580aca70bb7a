//! `IndexingStatus` — the observable progress singleton (spec.md §3, §9
//! "Global mutable state").
//!
//! Written only by the indexing task; read concurrently by status
//! callers as a best-effort snapshot. A single `tokio::sync::RwLock`
//! guards the whole record so a reader never observes a torn multi-field
//! read (spec.md §5).

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingStatus {
    pub is_indexing: bool,
    pub message: String,
    pub total_files: usize,
    pub processed_files: usize,
    pub current_file: Option<String>,
}

impl Default for IndexingStatus {
    fn default() -> Self {
        Self {
            is_indexing: false,
            message: "Idle".to_string(),
            total_files: 0,
            processed_files: 0,
            current_file: None,
        }
    }
}

/// Shared handle to the status record. Cloning is cheap (an `Arc` clone);
/// every clone sees the same underlying state.
#[derive(Clone)]
pub struct StatusHandle(Arc<RwLock<IndexingStatus>>);

impl StatusHandle {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(RwLock::new(IndexingStatus::default())))
    }

    /// A best-effort snapshot for callers of `GET /indexing/status`.
    pub async fn snapshot(&self) -> IndexingStatus {
        self.0.read().await.clone()
    }

    pub async fn set(&self, f: impl FnOnce(&mut IndexingStatus)) {
        let mut guard = self.0.write().await;
        f(&mut guard);
    }

    pub async fn is_indexing(&self) -> bool {
        self.0.read().await.is_indexing
    }
}

impl Default for StatusHandle {
    fn default() -> Self {
        Self::new()
    }
}
