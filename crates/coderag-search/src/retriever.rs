//! `Retriever::ask` — the RAG orchestrator (spec.md §4.7).
//!
//! Constructor-injected `Arc<dyn EmbeddingClient>` / `Arc<dyn VectorStore>`,
//! an `lru::LruCache` guarded by a `Mutex`, and `#[tracing::instrument]`
//! spans carrying a `CorrelationId`. No repository/tenant metadata
//! enrichment and no retry-with-backoff around the vector search: this
//! system has no multi-tenant database and `VectorStore::search` is
//! infallible over an in-memory index (see DESIGN.md).

use coderag_common::CorrelationId;
use coderag_embeddings::EmbeddingClient;
use coderag_parsing::SearchResult;
use coderag_vector_data::VectorStore;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// `similarity > 0.1` is the strict boundary for "meaningful" (spec.md §4.7, §8).
const SIMILARITY_THRESHOLD: f32 = 0.1;
/// Top-k search depth on the normal path.
const TOP_K: usize = 5;
/// File-path cap used in every degraded-mode system prompt.
const DEGRADED_FILE_CAP: usize = 50;
/// File-path cap used in the normal-path system prompt.
const FULL_FILE_CAP: usize = 100;
/// Answer cache capacity; a latency optimization only (spec.md expansion, §4.7).
const ANSWER_CACHE_CAPACITY: usize = 100;

/// Orchestrates one question → answer round trip, with the three
/// degraded-mode branches spec.md §4.7 requires.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embeddings: Arc<dyn EmbeddingClient>,
    cache: Mutex<LruCache<String, String>>,
}

impl Retriever {
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, embeddings: Arc<dyn EmbeddingClient>) -> Self {
        Self {
            store,
            embeddings,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(ANSWER_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    /// Drop every cached answer. Must be called whenever the store
    /// changes (`upsert`/`delete_file_chunks`/`clear`) so the cache can
    /// never serve an answer that predates a re-index (spec.md §4.7 "added").
    pub async fn invalidate_cache(&self) {
        self.cache.lock().await.clear();
    }

    /// Answer `question`, grounded in whatever the index currently holds.
    #[tracing::instrument(skip(self, question), fields(correlation_id, cached = false))]
    pub async fn ask(&self, question: &str) -> String {
        let correlation_id = CorrelationId::new();
        tracing::Span::current().record("correlation_id", correlation_id.to_string());

        if let Some(cached) = self.cache.lock().await.get(question) {
            tracing::Span::current().record("cached", true);
            metrics::counter!("coderag_retriever_cache_hits_total").increment(1);
            return cached.clone();
        }
        metrics::counter!("coderag_retriever_cache_misses_total").increment(1);

        let answer = self.answer_uncached(question).await;
        self.cache
            .lock()
            .await
            .put(question.to_string(), answer.clone());
        answer
    }

    async fn answer_uncached(&self, question: &str) -> String {
        let files = match self.store.all_files().await {
            Ok(files) => files,
            Err(err) => {
                tracing::warn!(error = %err, "failed to list indexed files, treating as empty");
                Vec::new()
            }
        };

        if files.is_empty() {
            tracing::info!("degraded mode A: empty index");
            let prompt = empty_index_prompt();
            return self.embeddings.chat(question, &prompt).await;
        }

        if !self.embeddings.is_healthy().await {
            tracing::info!("degraded mode B: embedding server unhealthy");
            let prompt = unavailable_prompt(
                &files,
                "the embedding model is currently unreachable, so file contents cannot be searched",
            );
            return self.embeddings.chat(question, &prompt).await;
        }

        let query_vector = self.embeddings.embed(question).await;
        if is_zero_vector(&query_vector) {
            tracing::info!("degraded mode C: query embedding fell back to the zero vector");
            let prompt = unavailable_prompt(
                &files,
                "generating an embedding for this question failed, so file contents cannot be searched",
            );
            return self.embeddings.chat(question, &prompt).await;
        }

        let results = match self.store.search(&query_vector, TOP_K).await {
            Ok(results) => results,
            Err(err) => {
                tracing::warn!(error = %err, "vector search failed, continuing with no results");
                Vec::new()
            }
        };
        let has_meaningful_results = results.iter().any(|r| r.similarity > SIMILARITY_THRESHOLD);

        let prompt = normal_prompt(&files, &results, has_meaningful_results);
        self.embeddings.chat(question, &prompt).await
    }
}

fn is_zero_vector(vector: &[f32]) -> bool {
    vector.iter().all(|component| *component == 0.0)
}

fn empty_index_prompt() -> String {
    "This codebase has not been indexed yet, so no files are available. Tell the user their \
     repository appears empty and suggest they start an indexing run before asking questions \
     about its contents."
        .to_string()
}

fn unavailable_prompt(files: &[String], caveat: &str) -> String {
    let mut prompt = format!(
        "This codebase contains {} file(s). {caveat}\n\nFiles:\n",
        files.len()
    );
    append_file_list(&mut prompt, files, DEGRADED_FILE_CAP);
    prompt
}

fn normal_prompt(files: &[String], results: &[SearchResult], has_meaningful_results: bool) -> String {
    let mut prompt = format!("This codebase contains {} file(s).\n\nFiles:\n", files.len());
    append_file_list(&mut prompt, files, FULL_FILE_CAP);

    prompt.push('\n');
    if has_meaningful_results {
        prompt.push_str("Relevant snippets:\n\n");
        for result in results.iter().filter(|r| r.similarity > SIMILARITY_THRESHOLD) {
            prompt.push_str(&format!(
                "--- {} (lines {}-{}, similarity {:.3}) ---\n{}\n\n",
                result.chunk.file_name,
                result.chunk.start_line,
                result.chunk.end_line,
                result.similarity,
                result.chunk.content
            ));
        }
    } else {
        prompt.push_str("No relevant code snippets were found for this question.\n");
    }

    prompt
}

fn append_file_list(prompt: &mut String, files: &[String], cap: usize) {
    let shown = files.iter().take(cap);
    for file in shown {
        prompt.push_str("- ");
        prompt.push_str(file);
        prompt.push('\n');
    }
    if files.len() > cap {
        prompt.push_str(&format!("...and {} more\n", files.len() - cap));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use coderag_parsing::Chunk;
    use coderag_vector_data::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubEmbeddings {
        healthy: bool,
        zero_vector: bool,
        chat_calls: AtomicUsize,
    }

    impl StubEmbeddings {
        fn healthy() -> Self {
            Self {
                healthy: true,
                zero_vector: false,
                chat_calls: AtomicUsize::new(0),
            }
        }
        fn unhealthy() -> Self {
            Self {
                healthy: false,
                zero_vector: false,
                chat_calls: AtomicUsize::new(0),
            }
        }
        fn zero_vector_fallback() -> Self {
            Self {
                healthy: true,
                zero_vector: true,
                chat_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingClient for StubEmbeddings {
        async fn embed(&self, _text: &str) -> Vec<f32> {
            if self.zero_vector {
                vec![0.0, 0.0]
            } else {
                vec![1.0, 0.0]
            }
        }
        async fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
            let mut out = Vec::new();
            for t in texts {
                out.push(self.embed(t).await);
            }
            out
        }
        async fn chat(&self, _user_prompt: &str, system_prompt: &str) -> String {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            system_prompt.to_string()
        }
        async fn is_healthy(&self) -> bool {
            self.healthy
        }
        fn embedding_dimension(&self) -> usize {
            2
        }
    }

    fn sample_chunk(path: &str) -> Chunk {
        Chunk::new(
            path.to_string(),
            "fn sample() {}".to_string(),
            1,
            1,
            chrono::Utc::now(),
            "rust",
            vec![],
        )
    }

    #[tokio::test]
    async fn empty_index_triggers_degraded_mode_a_without_embedding_the_question() {
        let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
        let embeddings = Arc::new(StubEmbeddings::healthy());
        let retriever = Retriever::new(store, Arc::clone(&embeddings) as Arc<dyn EmbeddingClient>);

        let answer = retriever.ask("List files").await;
        assert!(answer.contains("has not been indexed"));
    }

    #[tokio::test]
    async fn unhealthy_embedder_triggers_degraded_mode_b() {
        let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
        store
            .upsert(vec![sample_chunk("src/a.rs")])
            .await
            .unwrap();
        let embeddings: Arc<dyn EmbeddingClient> = Arc::new(StubEmbeddings::unhealthy());
        let retriever = Retriever::new(store, embeddings);

        let answer = retriever.ask("What does this do?").await;
        assert!(answer.contains("embedding model is currently unreachable"));
        assert!(answer.contains("src/a.rs"));
    }

    #[tokio::test]
    async fn zero_vector_fallback_triggers_degraded_mode_c() {
        let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
        store
            .upsert(vec![sample_chunk("src/a.rs")])
            .await
            .unwrap();
        let embeddings: Arc<dyn EmbeddingClient> = Arc::new(StubEmbeddings::zero_vector_fallback());
        let retriever = Retriever::new(store, embeddings);

        let answer = retriever.ask("What does this do?").await;
        assert!(answer.contains("generating an embedding"));
    }

    #[tokio::test]
    async fn similarity_at_exactly_threshold_is_not_meaningful() {
        let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
        // Orthogonal embedding gives similarity 0.0, below the 0.1 threshold.
        let mut chunk = sample_chunk("src/a.rs");
        chunk.embedding = Some(vec![0.0, 1.0]);
        store.upsert(vec![chunk]).await.unwrap();

        let embeddings: Arc<dyn EmbeddingClient> = Arc::new(StubEmbeddings::healthy());
        let retriever = Retriever::new(store, embeddings);

        let answer = retriever.ask("anything").await;
        assert!(answer.contains("No relevant code snippets were found"));
    }

    #[tokio::test]
    async fn meaningful_results_are_included_in_the_prompt() {
        let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
        let mut chunk = sample_chunk("src/a.rs");
        chunk.embedding = Some(vec![1.0, 0.0]);
        store.upsert(vec![chunk]).await.unwrap();

        let embeddings: Arc<dyn EmbeddingClient> = Arc::new(StubEmbeddings::healthy());
        let retriever = Retriever::new(store, embeddings);

        let answer = retriever.ask("what does sample do?").await;
        assert!(answer.contains("Relevant snippets"));
        assert!(answer.contains("similarity 1.000"));
    }

    #[tokio::test]
    async fn repeated_questions_are_served_from_cache() {
        let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
        let mut chunk = sample_chunk("src/a.rs");
        chunk.embedding = Some(vec![1.0, 0.0]);
        store.upsert(vec![chunk]).await.unwrap();

        let embeddings = Arc::new(StubEmbeddings::healthy());
        let retriever = Retriever::new(store, Arc::clone(&embeddings) as Arc<dyn EmbeddingClient>);

        let _ = retriever.ask("what does sample do?").await;
        let _ = retriever.ask("what does sample do?").await;

        assert_eq!(embeddings.chat_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_cache_forces_a_fresh_answer() {
        let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
        let mut chunk = sample_chunk("src/a.rs");
        chunk.embedding = Some(vec![1.0, 0.0]);
        store.upsert(vec![chunk]).await.unwrap();

        let embeddings = Arc::new(StubEmbeddings::healthy());
        let retriever = Retriever::new(store, Arc::clone(&embeddings) as Arc<dyn EmbeddingClient>);

        let _ = retriever.ask("what does sample do?").await;
        retriever.invalidate_cache().await;
        let _ = retriever.ask("what does sample do?").await;

        assert_eq!(embeddings.chat_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn degraded_prompt_truncates_past_the_fifty_file_cap() {
        let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
        let chunks: Vec<Chunk> = (0..60).map(|i| sample_chunk(&format!("src/f{i}.rs"))).collect();
        store.upsert(chunks).await.unwrap();

        let embeddings: Arc<dyn EmbeddingClient> = Arc::new(StubEmbeddings::unhealthy());
        let retriever = Retriever::new(store, embeddings);

        let answer = retriever.ask("anything").await;
        assert!(answer.contains("and 10 more"));
    }
}
