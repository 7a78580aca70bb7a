//! The embedding client (spec.md §4.4): issues embed and chat calls to the
//! remote model server, with retry, timeout, health cache, and a
//! zero-vector fallback.

pub mod error;
pub mod health;
pub mod ollama;
pub mod traits;

pub use error::{EmbeddingError, EmbeddingResult};
pub use ollama::OllamaClient;
pub use traits::EmbeddingClient;
