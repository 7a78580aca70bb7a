//! Route wiring for the `coderag-api` binary (spec.md §6 HTTP surface table).

pub mod chat;
pub mod health;
pub mod indexing;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

/// Build the full application router over `state`.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/indexing/rebuild", post(indexing::rebuild))
        .route("/indexing/cancel", post(indexing::cancel))
        .route("/indexing/status", get(indexing::status))
        .route("/indexing/files", get(indexing::files))
        .route("/indexing/browse", get(indexing::browse))
        .route("/chat", post(chat::chat))
        .with_state(state)
}
