//! `Indexer` — the single long-running coordinator (spec.md §4.6).
//!
//! A coordinator holding `Arc<dyn EmbeddingClient>` / `Arc<dyn VectorStore>`,
//! bounded concurrency, and per-file/per-batch `tracing` logging. Single-job,
//! single-process: no persistent job queue, no cross-process worker pool.

use crate::error::{IndexerError, IndexerResult};
use crate::status::StatusHandle;
use chrono::Utc;
use coderag_config::IndexingConfig;
use coderag_embeddings::EmbeddingClient;
use coderag_parsing::Chunk;
use coderag_vector_data::VectorStore;
use futures::stream::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Coordinates one indexing run at a time: scan → mtime-skip → bounded
/// parallel per-file processing → batched embedding → upsert.
pub struct Indexer {
    store: Arc<dyn VectorStore>,
    embeddings: Arc<dyn EmbeddingClient>,
    status: StatusHandle,
    max_parallelism: usize,
    embedding_batch_size: usize,
    active: Arc<AtomicBool>,
    cancel: Arc<Mutex<Option<CancellationToken>>>,
}

impl Indexer {
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        embeddings: Arc<dyn EmbeddingClient>,
        config: &IndexingConfig,
    ) -> Self {
        Self {
            store,
            embeddings,
            status: StatusHandle::new(),
            max_parallelism: config.max_parallelism.max(1),
            embedding_batch_size: config.embedding_batch_size.max(1),
            active: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusHandle {
        self.status.clone()
    }

    /// Signal cancellation of the in-flight run, if any. Idempotent;
    /// a no-op when idle (spec.md §4.6 "Cancellation").
    pub async fn cancel(&self) {
        if let Some(token) = self.cancel.lock().await.as_ref() {
            token.cancel();
        }
    }

    /// Start indexing `root_path`. A second call while a run is already
    /// active returns immediately without effect (spec.md §4.6).
    ///
    /// # Errors
    /// Returns `IndexerError::RootNotFound`/`NotADirectory` only for the
    /// boundary check before any work begins; everything after that is
    /// surfaced via `IndexingStatus.message`, never as an error to the
    /// caller (spec.md §7).
    pub async fn start_indexing(
        &self,
        root_path: &str,
        exclude_patterns: Option<Vec<String>>,
    ) -> IndexerResult<()> {
        let root_path = root_path.trim_matches(|c| c == '"' || c == '\'').to_string();

        if self.active.swap(true, Ordering::SeqCst) {
            tracing::warn!(root = %root_path, "start_indexing called while a run is already active; ignoring");
            return Ok(());
        }

        let result = self.run(&root_path, exclude_patterns.unwrap_or_default()).await;
        self.active.store(false, Ordering::SeqCst);
        *self.cancel.lock().await = None;
        result
    }

    async fn run(&self, root_path: &str, exclude_patterns: Vec<String>) -> IndexerResult<()> {
        let root = PathBuf::from(root_path);
        if !root.exists() {
            let message = format!("root path does not exist: {root_path}");
            self.status
                .set(|s| {
                    s.is_indexing = false;
                    s.message = message.clone();
                })
                .await;
            return Err(IndexerError::RootNotFound(root_path.to_string()));
        }
        if !root.is_dir() {
            let message = format!("root path is not a directory: {root_path}");
            self.status
                .set(|s| {
                    s.is_indexing = false;
                    s.message = message.clone();
                })
                .await;
            return Err(IndexerError::NotADirectory(root_path.to_string()));
        }

        let token = CancellationToken::new();
        *self.cancel.lock().await = Some(token.clone());

        self.status
            .set(|s| {
                s.is_indexing = true;
                s.message = "Scanning files...".to_string();
                s.total_files = 0;
                s.processed_files = 0;
                s.current_file = None;
            })
            .await;

        let project_type = coderag_parsing::detect_project_type(&root);
        let crawler: Arc<dyn coderag_parsing::Crawler> = Arc::from(coderag_parsing::crawler_for(project_type));
        let files = {
            let crawler = Arc::clone(&crawler);
            tokio::task::spawn_blocking(move || crawler.scan(&root, &exclude_patterns))
                .await
                .unwrap_or_default()
        };

        self.status.set(|s| s.total_files = files.len()).await;

        let collected: Arc<Mutex<Vec<Chunk>>> = Arc::new(Mutex::new(Vec::new()));

        self.process_files(&crawler, files, &token, &collected).await;

        let was_cancelled = token.is_cancelled();
        if !was_cancelled {
            self.status
                .set(|s| s.message = "Embedding and storing chunks...".to_string())
                .await;
            self.embed_and_store(collected, &token).await;
        }

        let processed = self.status.snapshot().await.processed_files;
        let total = self.status.snapshot().await.total_files;
        let message = if was_cancelled {
            format!("Indexing cancelled after processing {processed}/{total} files")
        } else {
            format!("Indexing complete: processed {processed}/{total} files")
        };
        self.status
            .set(|s| {
                s.is_indexing = false;
                s.message = message;
                s.current_file = None;
            })
            .await;

        Ok(())
    }

    async fn process_files(
        &self,
        crawler: &Arc<dyn coderag_parsing::Crawler>,
        files: Vec<PathBuf>,
        token: &CancellationToken,
        collected: &Arc<Mutex<Vec<Chunk>>>,
    ) {
        let status = self.status.clone();
        let store = Arc::clone(&self.store);
        let max_parallelism = self.max_parallelism;

        futures::stream::iter(files.into_iter().map(|path| {
            let crawler = Arc::clone(crawler);
            let token = token.clone();
            let status = status.clone();
            let store = Arc::clone(&store);
            let collected = Arc::clone(collected);
            async move {
                if token.is_cancelled() {
                    return;
                }
                process_one_file(&crawler, &path, &store, &collected, &status).await;
            }
        }))
        .buffer_unordered(max_parallelism)
        .for_each(|()| async {})
        .await;
    }

    async fn embed_and_store(&self, collected: Arc<Mutex<Vec<Chunk>>>, token: &CancellationToken) {
        let chunks = std::mem::take(&mut *collected.lock().await);
        for batch in chunks.chunks(self.embedding_batch_size) {
            if token.is_cancelled() {
                break;
            }
            let contents: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embeddings.embed_batch(&contents).await;

            let mut batch_chunks: Vec<Chunk> = batch.to_vec();
            for (chunk, vector) in batch_chunks.iter_mut().zip(vectors) {
                chunk.embedding = Some(vector);
            }

            if let Err(err) = self.store.upsert(batch_chunks).await {
                tracing::warn!(error = %err, "batch upsert failed, dropping batch");
            }
        }
    }
}

async fn process_one_file(
    crawler: &Arc<dyn coderag_parsing::Crawler>,
    path: &Path,
    store: &Arc<dyn VectorStore>,
    collected: &Arc<Mutex<Vec<Chunk>>>,
    status: &StatusHandle,
) {
    let file_path = path.to_string_lossy().into_owned();
    status
        .set(|s| {
            s.current_file = Some(file_path.clone());
        })
        .await;

    let stat_path = path.to_path_buf();
    let stat_result = tokio::task::spawn_blocking(move || std::fs::metadata(&stat_path).and_then(|m| m.modified()))
        .await
        .unwrap_or_else(|err| Err(std::io::Error::other(err.to_string())));
    let mtime = match stat_result {
        Ok(modified) => chrono::DateTime::<Utc>::from(modified),
        Err(err) => {
            tracing::warn!(path = %file_path, error = %err, "could not stat file, skipping");
            status.set(|s| s.processed_files += 1).await;
            return;
        }
    };

    let stored_mtime = match store.last_modified(&file_path).await {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(path = %file_path, error = %err, "could not read stored last_modified");
            None
        }
    };

    if let Some(stored) = stored_mtime
        && stored >= mtime
    {
        status.set(|s| s.processed_files += 1).await;
        return;
    }

    if stored_mtime.is_some()
        && let Err(err) = store.delete_file_chunks(&file_path).await
    {
        tracing::warn!(path = %file_path, error = %err, "failed to delete stale chunks before re-index");
    }

    let crawler = Arc::clone(crawler);
    let path_buf = path.to_path_buf();
    let chunks = match tokio::task::spawn_blocking(move || crawler.process(&path_buf)).await {
        Ok(chunks) => chunks,
        Err(err) => {
            tracing::warn!(path = %file_path, error = %err, "per-file processing task panicked");
            Vec::new()
        }
    };

    let chunks: Vec<Chunk> = chunks
        .into_iter()
        .map(|mut chunk| {
            chunk.last_modified = mtime;
            chunk
        })
        .collect();

    collected.lock().await.extend(chunks);
    status.set(|s| s.processed_files += 1).await;
}
