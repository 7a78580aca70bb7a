//! Application state for Axum handlers (spec.md §9 "Global mutable state").
//!
//! Holds the shared services every route handler needs, constructed once at
//! startup by `bootstrap::initialize_app_state` and cloned (cheaply, via
//! `Arc`) into every request.

use std::sync::Arc;

use coderag_embeddings::EmbeddingClient;
use coderag_indexing::Indexer;
use coderag_search::Retriever;
use coderag_vector_data::VectorStore;

/// Shared resources behind every handler in `routes/`.
#[derive(Clone)]
pub struct AppState {
    /// The vector store backing both the indexer and the retriever.
    pub vector_store: Arc<dyn VectorStore>,
    /// The embedding/chat model client.
    pub embedding_client: Arc<dyn EmbeddingClient>,
    /// The single-job indexing coordinator (spec.md §4.6).
    pub indexer: Arc<Indexer>,
    /// The query-time retrieval/orchestration service (spec.md §4.7).
    pub retriever: Arc<Retriever>,
}
