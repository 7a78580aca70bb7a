//! HTTP-layer integration tests driving a real `Router` via
//! `tower::ServiceExt::oneshot`, with a stub `EmbeddingClient` standing in
//! for the remote model server so these tests run with no network access
//! (spec.md §8 scenarios 1, 2, 4).

use axum::body::Body;
use axum::http::{Request, StatusCode};
use coderag_api::routes::create_router;
use coderag_api::state::AppState;
use coderag_embeddings::EmbeddingClient;
use coderag_indexing::Indexer;
use coderag_search::Retriever;
use coderag_vector_data::{MemoryStore, VectorStore};
use serde_json::{Value, json};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct StubEmbeddings {
    healthy: bool,
}

#[async_trait::async_trait]
impl EmbeddingClient for StubEmbeddings {
    async fn embed(&self, _text: &str) -> Vec<f32> {
        vec![1.0, 0.0]
    }
    async fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|_| vec![1.0, 0.0]).collect()
    }
    async fn chat(&self, _user_prompt: &str, system_prompt: &str) -> String {
        system_prompt.to_string()
    }
    async fn is_healthy(&self) -> bool {
        self.healthy
    }
    fn embedding_dimension(&self) -> usize {
        2
    }
}

fn test_state() -> AppState {
    let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
    let embeddings: Arc<dyn EmbeddingClient> = Arc::new(StubEmbeddings { healthy: true });
    let indexing_config = coderag_config::IndexingConfig {
        max_parallelism: 2,
        embedding_batch_size: 10,
    };
    let indexer = Arc::new(Indexer::new(
        Arc::clone(&store),
        Arc::clone(&embeddings),
        &indexing_config,
    ));
    let retriever = Arc::new(Retriever::new(Arc::clone(&store), Arc::clone(&embeddings)));
    AppState {
        vector_store: store,
        embedding_client: embeddings,
        indexer,
        retriever,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = create_router(test_state());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn chat_against_empty_index_uses_degraded_mode_a() {
    let app = create_router(test_state());
    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(json!({"message": "List files"}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["answer"].as_str().unwrap().contains("has not been indexed"));
}

#[tokio::test]
async fn chat_rejects_empty_message() {
    let app = create_router(test_state());
    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(json!({"message": ""}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rebuild_rejects_empty_root_path() {
    let app = create_router(test_state());
    let request = Request::builder()
        .method("POST")
        .uri("/indexing/rebuild")
        .header("content-type", "application/json")
        .body(Body::from(json!({"rootPath": ""}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rebuild_accepts_a_real_directory_and_status_converges() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("a.cs"),
        "class Greeter { public string Foo() { return \"hi\"; } }",
    )
    .unwrap();

    let state = test_state();
    let indexer = Arc::clone(&state.indexer);
    let app = create_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/indexing/rebuild")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"rootPath": dir.path().to_str().unwrap()}).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    for _ in 0..50 {
        if !indexer.status().is_indexing().await {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(!indexer.status().is_indexing().await);
    assert_eq!(indexer.status().snapshot().await.processed_files, 1);
}

#[tokio::test]
async fn cancel_when_idle_returns_ok() {
    let app = create_router(test_state());
    let request = Request::builder()
        .method("POST")
        .uri("/indexing/cancel")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn files_endpoint_rejects_nonexistent_root() {
    let app = create_router(test_state());
    let request = Request::builder()
        .uri("/indexing/files?root=/no/such/path")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn browse_with_no_path_lists_root_entry() {
    let app = create_router(test_state());
    let request = Request::builder()
        .uri("/indexing/browse")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.as_array().unwrap().iter().any(|e| e["path"] == "/"));
}
