//! `OllamaClient`: the embed/chat/health implementation of
//! `EmbeddingClient` fronting the remote model server's wire contract
//! (spec.md §6).

use crate::health::HealthCache;
use crate::traits::EmbeddingClient;
use async_trait::async_trait;
use coderag_config::OllamaConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const APOLOGY: &str = "I'm sorry, I couldn't reach the chat model to answer that right now.";
const EMPTY_RESPONSE: &str = "The chat model returned an empty response.";
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

/// HTTP client for a remote Ollama-compatible model server: `POST
/// /api/embed`, `POST /api/chat`, `GET /api/tags` (spec.md §6).
pub struct OllamaClient {
    http: reqwest::Client,
    config: OllamaConfig,
    health: HealthCache,
}

impl OllamaClient {
    /// # Panics
    /// Panics if the underlying `reqwest::Client` fails to build (e.g. TLS
    /// backend initialization failure), mirroring `reqwest`'s own
    /// `Client::new()` panic contract.
    #[must_use]
    pub fn new(config: OllamaConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_minutes * 60))
            .build()
            .expect("failed to build reqwest client");
        Self {
            http,
            config,
            health: HealthCache::new(),
        }
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        let base = self.config.retry_delay_base_seconds.max(1);
        Duration::from_secs(base.saturating_pow(attempt))
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>, CallError> {
        let url = format!("{}/api/embed", self.config.base_url);
        let body = EmbedRequest {
            model: &self.config.embedding_model,
            input: text,
        };
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(CallError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallError::from_status(status));
        }
        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| CallError::Permanent(e.to_string()))?;
        if parsed.embedding.is_empty() {
            return Err(CallError::Permanent("empty embedding vector".to_string()));
        }
        Ok(parsed.embedding)
    }

    async fn chat_once(&self, user_prompt: &str, system_prompt: &str) -> Result<String, CallError> {
        let url = format!("{}/api/chat", self.config.base_url);
        let body = ChatRequest {
            model: &self.config.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            stream: false,
        };
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(CallError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallError::from_status(status));
        }
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CallError::Permanent(e.to_string()))?;
        Ok(parsed.message.content)
    }

    /// Retry `attempt_fn` with exponential backoff, up to
    /// `config.max_retries` attempts total — but only for transient
    /// failures (5xx, timeout, connection reset). A `CallError::Permanent`
    /// (4xx, malformed body) is returned on the first attempt (spec.md
    /// §4.4, §7 "Transient remote" vs. "Permanent remote").
    async fn with_retry<T, F, Fut>(&self, mut attempt_fn: F) -> Result<T, String>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, CallError>>,
    {
        let mut last_err = String::new();
        for attempt in 0..self.config.max_retries.max(1) {
            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(CallError::Permanent(message)) => return Err(message),
                Err(CallError::Retryable(message)) => {
                    last_err = message;
                    if attempt + 1 < self.config.max_retries.max(1) {
                        tokio::time::sleep(self.retry_delay(attempt + 1)).await;
                    }
                }
            }
        }
        Err(last_err)
    }
}

/// Distinguishes transient failures (worth retrying) from permanent ones
/// (spec.md §7): a 5xx response, a connection reset, or a timeout is
/// `Retryable`; a 4xx response or a malformed/empty body is `Permanent`.
enum CallError {
    Retryable(String),
    Permanent(String),
}

impl CallError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::Retryable(err.to_string())
        } else {
            Self::Permanent(err.to_string())
        }
    }

    fn from_status(status: reqwest::StatusCode) -> Self {
        if status.is_server_error() {
            Self::Retryable(format!("status {status}"))
        } else {
            Self::Permanent(format!("status {status}"))
        }
    }
}

#[async_trait]
impl EmbeddingClient for OllamaClient {
    async fn embed(&self, text: &str) -> Vec<f32> {
        let start = std::time::Instant::now();
        let result = self.with_retry(|| self.embed_once(text)).await;
        metrics::histogram!("coderag_embed_latency_seconds").record(start.elapsed().as_secs_f64());

        match result {
            Ok(vector) => {
                self.health.record(true);
                metrics::counter!("coderag_embed_requests_total", "outcome" => "ok").increment(1);
                vector
            }
            Err(err) => {
                tracing::warn!(error = %err, "embed call failed, falling back to zero vector");
                self.health.record(false);
                metrics::counter!("coderag_embed_requests_total", "outcome" => "fallback")
                    .increment(1);
                vec![0.0; self.config.fallback_embedding_dimension]
            }
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await);
        }
        out
    }

    async fn chat(&self, user_prompt: &str, system_prompt: &str) -> String {
        let start = std::time::Instant::now();
        let result = self
            .with_retry(|| self.chat_once(user_prompt, system_prompt))
            .await;
        metrics::histogram!("coderag_chat_latency_seconds").record(start.elapsed().as_secs_f64());

        match result {
            Ok(content) if content.trim().is_empty() => {
                self.health.record(true);
                EMPTY_RESPONSE.to_string()
            }
            Ok(content) => {
                self.health.record(true);
                metrics::counter!("coderag_chat_requests_total", "outcome" => "ok").increment(1);
                content
            }
            Err(err) => {
                tracing::warn!(error = %err, "chat call failed, returning apology");
                self.health.record(false);
                metrics::counter!("coderag_chat_requests_total", "outcome" => "fallback")
                    .increment(1);
                APOLOGY.to_string()
            }
        }
    }

    async fn is_healthy(&self) -> bool {
        if let Some(cached) = self.health.cached() {
            return cached;
        }

        let url = format!("{}/api/tags", self.config.base_url);
        let healthy = match self
            .http
            .get(&url)
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::warn!(error = %err, "health probe failed");
                false
            }
        };
        self.health.record(healthy);
        healthy
    }

    fn embedding_dimension(&self) -> usize {
        self.config.fallback_embedding_dimension
    }
}
