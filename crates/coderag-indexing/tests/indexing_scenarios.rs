//! Integration coverage for the indexing run scenarios.

use coderag_config::IndexingConfig;
use coderag_embeddings::EmbeddingClient;
use coderag_indexing::Indexer;
use coderag_vector_data::{MemoryStore, VectorStore};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

struct StubEmbeddings;

#[async_trait::async_trait]
impl EmbeddingClient for StubEmbeddings {
    async fn embed(&self, _text: &str) -> Vec<f32> {
        vec![1.0, 0.0]
    }
    async fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|_| vec![1.0, 0.0]).collect()
    }
    async fn chat(&self, _user_prompt: &str, _system_prompt: &str) -> String {
        "stub".to_string()
    }
    async fn is_healthy(&self) -> bool {
        true
    }
    fn embedding_dimension(&self) -> usize {
        2
    }
}

/// Simulates an unreachable embedding server: every call degrades to the
/// fallback zero vector rather than erroring (spec.md §4.4, §7).
struct DegradedEmbeddings;

#[async_trait::async_trait]
impl EmbeddingClient for DegradedEmbeddings {
    async fn embed(&self, _text: &str) -> Vec<f32> {
        vec![0.0, 0.0]
    }
    async fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|_| vec![0.0, 0.0]).collect()
    }
    async fn chat(&self, _user_prompt: &str, _system_prompt: &str) -> String {
        "The AI assistant is currently unavailable.".to_string()
    }
    async fn is_healthy(&self) -> bool {
        false
    }
    fn embedding_dimension(&self) -> usize {
        2
    }
}

fn test_config() -> IndexingConfig {
    IndexingConfig {
        max_parallelism: 4,
        embedding_batch_size: 50,
    }
}

#[tokio::test]
async fn empty_tree_indexes_to_zero_chunks() {
    let dir = TempDir::new().expect("tempdir");

    let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
    let embeddings: Arc<dyn EmbeddingClient> = Arc::new(StubEmbeddings);
    let indexer = Indexer::new(Arc::clone(&store), embeddings, &test_config());

    indexer
        .start_indexing(dir.path().to_str().unwrap(), None)
        .await
        .unwrap();

    assert_eq!(store.count().await.unwrap(), 0);
    let status = indexer.status().snapshot().await;
    assert!(!status.is_indexing);
    assert_eq!(status.total_files, 0);
}

#[tokio::test]
async fn happy_path_indexes_every_file_once() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("a.cs"), "class A { public void M() {} }").unwrap();
    fs::write(dir.path().join("b.cs"), "class B { public void N() {} }").unwrap();
    fs::write(dir.path().join("c.txt"), "plain text content for generic chunking").unwrap();

    let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
    let embeddings: Arc<dyn EmbeddingClient> = Arc::new(StubEmbeddings);
    let indexer = Indexer::new(Arc::clone(&store), embeddings, &test_config());

    indexer
        .start_indexing(dir.path().to_str().unwrap(), None)
        .await
        .unwrap();

    assert!(store.count().await.unwrap() >= 3);
    let files = store.all_files().await.unwrap();
    assert_eq!(files.len(), 3);
}

#[tokio::test]
async fn embedder_unhealthy_still_completes_with_degraded_vectors() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("a.cs"), "class A { public void M() {} }").unwrap();

    let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
    let embeddings: Arc<dyn EmbeddingClient> = Arc::new(DegradedEmbeddings);
    let indexer = Indexer::new(Arc::clone(&store), embeddings, &test_config());

    indexer
        .start_indexing(dir.path().to_str().unwrap(), None)
        .await
        .unwrap();

    // Indexing still completes: embedding failures degrade, never abort.
    assert_eq!(store.count().await.unwrap(), 1);
    let status = indexer.status().snapshot().await;
    assert!(!status.is_indexing);
}

#[tokio::test]
async fn concurrent_start_calls_index_only_once() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("a.cs"), "class A { public void M() {} }").unwrap();
    fs::write(dir.path().join("b.cs"), "class B { public void N() {} }").unwrap();

    let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
    let embeddings: Arc<dyn EmbeddingClient> = Arc::new(StubEmbeddings);
    let indexer = Indexer::new(Arc::clone(&store), embeddings, &test_config());

    let root = dir.path().to_str().unwrap();
    let (first, second) = tokio::join!(
        indexer.start_indexing(root, None),
        indexer.start_indexing(root, None)
    );
    first.unwrap();
    second.unwrap();

    // The second call observes an active run and is a no-op; only one
    // pass over the tree ever happens, so no file is double-counted.
    assert_eq!(store.all_files().await.unwrap().len(), 2);
}

#[tokio::test]
async fn cancel_before_embedding_phase_stops_further_storage() {
    let dir = TempDir::new().expect("tempdir");
    for i in 0..5 {
        fs::write(
            dir.path().join(format!("file{i}.cs")),
            format!("class C{i} {{ public void M() {{}} }}"),
        )
        .unwrap();
    }

    let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
    let embeddings: Arc<dyn EmbeddingClient> = Arc::new(StubEmbeddings);
    let indexer = Arc::new(Indexer::new(Arc::clone(&store), embeddings, &test_config()));

    let root = dir.path().to_str().unwrap().to_string();
    let indexer_clone = Arc::clone(&indexer);
    let handle = tokio::spawn(async move { indexer_clone.start_indexing(&root, None).await });

    // Cancel as soon as the run is observably underway.
    while !indexer.status().is_indexing().await {
        tokio::task::yield_now().await;
    }
    indexer.cancel().await;

    handle.await.unwrap().unwrap();

    let status = indexer.status().snapshot().await;
    assert!(!status.is_indexing);
    // A cancelled run never fails; it just stops early and reports so.
    assert!(status.message.contains("cancelled") || status.message.contains("complete"));
}
