//! Application bootstrap and service initialization.
//!
//! One setup function per service, composed into a single `AppState`: the
//! vector store is the only shared mutable dependency the indexer and
//! retriever need, so there's no separate metadata-repository layer to wire
//! up (see DESIGN.md).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coderag_config::{ApplicationConfig, VectorStorageBackend};
use coderag_embeddings::{EmbeddingClient, OllamaClient};
use coderag_indexing::Indexer;
use coderag_parsing::{Chunk, SearchResult};
use coderag_search::Retriever;
use coderag_vector_data::{MemoryStore, VectorDataResult, VectorStore};

use crate::state::AppState;

/// Bootstrap result type, matching `main()`'s top-level error type.
pub type BootstrapResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Wraps the store the indexer writes through so every mutation drops the
/// retriever's answer cache — `Retriever::invalidate_cache` documents this
/// requirement but the indexer has no reason to depend on `coderag-search`
/// directly, so the notification lives here at the wiring layer instead.
struct CacheInvalidatingStore {
    inner: Arc<dyn VectorStore>,
    retriever: Arc<Retriever>,
}

#[async_trait]
impl VectorStore for CacheInvalidatingStore {
    async fn upsert(&self, chunks: Vec<Chunk>) -> VectorDataResult<()> {
        let result = self.inner.upsert(chunks).await;
        self.retriever.invalidate_cache().await;
        result
    }

    async fn search(&self, query: &[f32], limit: usize) -> VectorDataResult<Vec<SearchResult>> {
        self.inner.search(query, limit).await
    }

    async fn count(&self) -> VectorDataResult<usize> {
        self.inner.count().await
    }

    async fn clear(&self) -> VectorDataResult<()> {
        let result = self.inner.clear().await;
        self.retriever.invalidate_cache().await;
        result
    }

    async fn all_files(&self) -> VectorDataResult<Vec<String>> {
        self.inner.all_files().await
    }

    async fn last_modified(&self, file_path: &str) -> VectorDataResult<Option<DateTime<Utc>>> {
        self.inner.last_modified(file_path).await
    }

    async fn delete_file_chunks(&self, file_path: &str) -> VectorDataResult<()> {
        let result = self.inner.delete_file_chunks(file_path).await;
        self.retriever.invalidate_cache().await;
        result
    }
}

/// Build the `VectorStore` backend selected by `config.vector_storage.backend`.
///
/// # Errors
/// Returns an error if a `Postgres` backend is selected but the connection or
/// lazy schema migration fails.
pub async fn setup_vector_store(
    config: &ApplicationConfig,
) -> BootstrapResult<Arc<dyn VectorStore>> {
    match config.vector_storage.backend {
        VectorStorageBackend::Memory => {
            tracing::info!("using in-memory vector store");
            Ok(Arc::new(MemoryStore::new()) as Arc<dyn VectorStore>)
        }
        VectorStorageBackend::Postgres => {
            #[cfg(feature = "postgres")]
            {
                tracing::info!("connecting to postgres vector store");
                let store = coderag_vector_data::PostgresStore::connect(
                    &config.database.connection_string(),
                )
                .await?;
                Ok(Arc::new(store) as Arc<dyn VectorStore>)
            }
            #[cfg(not(feature = "postgres"))]
            {
                Err("vector_storage.backend = postgres requires building with --features postgres"
                    .into())
            }
        }
    }
}

/// Build the remote embedding/chat model client.
#[must_use]
pub fn setup_embedding_client(config: &ApplicationConfig) -> Arc<dyn EmbeddingClient> {
    tracing::info!(base_url = %config.ollama.base_url, "initializing embedding client");
    Arc::new(OllamaClient::new(config.ollama.clone())) as Arc<dyn EmbeddingClient>
}

/// Build the indexing coordinator. Writes through `retriever`'s store so
/// every upsert/delete/clear invalidates its answer cache.
#[must_use]
pub fn setup_indexer(
    config: &ApplicationConfig,
    store: &Arc<dyn VectorStore>,
    embeddings: &Arc<dyn EmbeddingClient>,
    retriever: &Arc<Retriever>,
) -> Arc<Indexer> {
    let notifying_store: Arc<dyn VectorStore> = Arc::new(CacheInvalidatingStore {
        inner: Arc::clone(store),
        retriever: Arc::clone(retriever),
    });
    Arc::new(Indexer::new(notifying_store, Arc::clone(embeddings), &config.indexing))
}

/// Build the retrieval/orchestration service.
#[must_use]
pub fn setup_retriever(
    store: &Arc<dyn VectorStore>,
    embeddings: &Arc<dyn EmbeddingClient>,
) -> Arc<Retriever> {
    Arc::new(Retriever::new(Arc::clone(store), Arc::clone(embeddings)))
}

/// Initialize all services and assemble `AppState`, in dependency order.
///
/// # Errors
/// Returns an error if the vector store backend fails to initialize.
pub async fn initialize_app_state(config: &ApplicationConfig) -> BootstrapResult<AppState> {
    let vector_store = setup_vector_store(config).await?;
    let embedding_client = setup_embedding_client(config);
    let retriever = setup_retriever(&vector_store, &embedding_client);
    let indexer = setup_indexer(config, &vector_store, &embedding_client, &retriever);

    tracing::info!("application state initialized");
    Ok(AppState {
        vector_store,
        embedding_client,
        indexer,
        retriever,
    })
}
