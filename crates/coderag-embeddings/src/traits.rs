//! Capability traits for the embedding/chat model client (spec.md §4.4,
//! §9 "Capability-based collaborators, not inheritance").

use async_trait::async_trait;

/// Fronts a remote model server's embed/chat/health surface. Every method
/// is infallible at this boundary: failures degrade to a fallback value
/// rather than propagating an error, per spec.md §7.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed a single piece of text. Falls back to a zero vector of the
    /// configured dimension on any transport/response failure.
    async fn embed(&self, text: &str) -> Vec<f32>;

    /// Embed a batch of texts, one vector per input, in order. A failure
    /// embedding one text substitutes a zero vector for that entry only —
    /// it never aborts the rest of the batch.
    async fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>>;

    /// Ask the chat model a question with a system prompt for grounding.
    /// Falls back to a fixed apology string on failure.
    async fn chat(&self, user_prompt: &str, system_prompt: &str) -> String;

    /// Cached liveness probe (spec.md §4.4: 30s cache when healthy, else
    /// re-probed with a 10s timeout).
    async fn is_healthy(&self) -> bool;

    /// The dimension of vectors this client produces (including its
    /// fallback zero vector), so callers can recognize a degraded result.
    fn embedding_dimension(&self) -> usize;
}
