//! Centralized configuration management for coderag
//!
//! This crate provides a unified configuration system that eliminates duplication
//! across the codebase and provides type-safe, validated configuration with
//! support for multiple sources (environment, files, CLI, etc.).
//!
//! Configuration follows a simple hierarchy:
//! 1. Safe defaults (defined as constants)
//! 2. Environment variable overrides
//! 3. Runtime validation

pub mod error;
pub mod profile;
pub mod source;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use profile::Profile;
pub use validation::Validate;

// =============================================================================
// SAFE DEFAULTS - Work for any environment (dev, staging, prod, test)
// =============================================================================

// Indexing configuration
const DEFAULT_MAX_PARALLELISM_FLOOR: usize = 1;
const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 50;

// Remote model server configuration
const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_EMBEDDING_MODEL: &str = "nomic-embed-text";
const DEFAULT_OLLAMA_CHAT_MODEL: &str = "llama3";
const DEFAULT_OLLAMA_REQUEST_TIMEOUT_MINUTES: u64 = 5;
const DEFAULT_OLLAMA_MAX_RETRIES: u32 = 3;
const DEFAULT_OLLAMA_RETRY_DELAY_SECONDS: u64 = 2;
const DEFAULT_OLLAMA_FALLBACK_EMBEDDING_DIMENSION: usize = 384;

// Vector storage configuration
const DEFAULT_VECTOR_STORAGE_BACKEND: VectorStorageBackend = VectorStorageBackend::Memory;

// Database configuration (only consulted when the vector storage backend is Postgres)
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_NAME: &str = "coderag";
const DEFAULT_DB_USER: &str = "coderag";
const DEFAULT_DB_PASSWORD: &str = "localdev123";
const DEFAULT_DB_SSL_MODE: &str = "disable";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

// API server configuration
const DEFAULT_API_HOST: &str = "127.0.0.1"; // Localhost only for security
const DEFAULT_API_PORT: u16 = 3000;
const DEFAULT_API_ENABLE_CORS: bool = true;
const DEFAULT_API_ENABLE_DOCS: bool = true;

// Telemetry configuration
const DEFAULT_TRACING_LEVEL: &str = "info";

/// Core configuration for the entire coderag application
///
/// All settings have safe defaults and can be overridden via environment variables.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApplicationConfig {
    /// Active deployment profile this configuration was built from
    pub profile: Profile,

    /// Indexer concurrency/batching configuration
    pub indexing: IndexingConfig,

    /// Remote embedding/chat model server configuration
    pub ollama: OllamaConfig,

    /// Vector storage backend configuration
    pub vector_storage: VectorStorageConfig,

    /// `PostgreSQL` connection configuration (used only by the `Postgres` vector backend)
    pub database: DatabaseConfig,

    /// API server configuration
    pub api: ApiConfig,

    /// Telemetry and observability configuration
    pub telemetry: TelemetryConfig,
}

/// `Indexing.MaxParallelism` / `Indexing.EmbeddingBatchSize`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IndexingConfig {
    /// Bounded concurrency for per-file crawling/chunking. Defaults to the host's CPU count.
    pub max_parallelism: usize,

    /// Number of chunks embedded per `embed_batch` call during indexing.
    pub embedding_batch_size: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_parallelism: std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(DEFAULT_MAX_PARALLELISM_FLOOR),
            embedding_batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
        }
    }
}

/// `Ollama.*` configuration keys from the external interfaces table.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the remote model server, e.g. `http://localhost:11434`.
    pub base_url: String,

    /// Model identifier passed as `"model"` in `POST /api/embed` bodies.
    pub embedding_model: String,

    /// Model identifier passed as `"model"` in `POST /api/chat` bodies.
    pub chat_model: String,

    /// Per-request timeout, in minutes, for embed/chat calls.
    pub request_timeout_minutes: u64,

    /// Maximum retry attempts for transient failures.
    pub max_retries: u32,

    /// Base, in seconds, of the exponential backoff delay (`base.pow(attempt)`).
    pub retry_delay_base_seconds: u64,

    /// Dimension of the zero-vector fallback returned when embedding fails.
    pub fallback_embedding_dimension: usize,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            embedding_model: DEFAULT_OLLAMA_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_OLLAMA_CHAT_MODEL.to_string(),
            request_timeout_minutes: DEFAULT_OLLAMA_REQUEST_TIMEOUT_MINUTES,
            max_retries: DEFAULT_OLLAMA_MAX_RETRIES,
            retry_delay_base_seconds: DEFAULT_OLLAMA_RETRY_DELAY_SECONDS,
            fallback_embedding_dimension: DEFAULT_OLLAMA_FALLBACK_EMBEDDING_DIMENSION,
        }
    }
}

/// Which `VectorStore` implementation the application wires up at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum VectorStorageBackend {
    /// In-memory reference store; state does not survive a restart.
    #[serde(rename = "memory")]
    Memory,

    /// `PostgreSQL` + pgvector durable backing store.
    #[serde(rename = "postgres")]
    Postgres,
}

/// Vector storage backend selection.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VectorStorageConfig {
    /// Which backend to construct.
    pub backend: VectorStorageBackend,
}

impl Default for VectorStorageConfig {
    fn default() -> Self {
        Self {
            backend: DEFAULT_VECTOR_STORAGE_BACKEND,
        }
    }
}

/// `PostgreSQL` connection settings, consulted only when `vector_storage.backend`
/// is `Postgres`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DatabaseConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database name.
    pub name: String,
    /// Database user.
    pub user: String,
    /// Database password.
    pub password: String,
    /// `sslmode` connection parameter.
    pub ssl_mode: String,
    /// Maximum pool size.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            name: DEFAULT_DB_NAME.to_string(),
            user: DEFAULT_DB_USER.to_string(),
            password: DEFAULT_DB_PASSWORD.to_string(),
            ssl_mode: DEFAULT_DB_SSL_MODE.to_string(),
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

impl DatabaseConfig {
    /// Build a `postgres://` connection string from the configured fields.
    #[must_use]
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.name, self.ssl_mode
        )
    }
}

/// HTTP API server settings.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApiConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Whether permissive CORS headers are attached to responses.
    pub enable_cors: bool,
    /// Whether the OpenAPI/Swagger UI routes are mounted.
    pub enable_docs: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_API_HOST.to_string(),
            port: DEFAULT_API_PORT,
            enable_cors: DEFAULT_API_ENABLE_CORS,
            enable_docs: DEFAULT_API_ENABLE_DOCS,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetryConfig {
    /// `tracing_subscriber::EnvFilter` default directive when `RUST_LOG` is unset.
    pub tracing_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tracing_level: DEFAULT_TRACING_LEVEL.to_string(),
        }
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self::with_profile(Profile::default())
    }
}

impl ApplicationConfig {
    /// Build a configuration for the given profile, applying profile-specific
    /// tweaks on top of the safe defaults (e.g. test profile shrinks batch
    /// sizes and parallelism for fast, deterministic test runs).
    #[must_use]
    pub fn with_profile(profile: Profile) -> Self {
        let mut config = Self {
            profile,
            indexing: IndexingConfig::default(),
            ollama: OllamaConfig::default(),
            vector_storage: VectorStorageConfig::default(),
            database: DatabaseConfig::default(),
            api: ApiConfig::default(),
            telemetry: TelemetryConfig::default(),
        };

        if profile == Profile::Test {
            config.indexing.max_parallelism = 2;
            config.indexing.embedding_batch_size = 4;
        }

        config
    }

    /// Load configuration from the environment, falling back to the
    /// profile-derived defaults for anything unset.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the `CODERAG_PROFILE` value can't be parsed
    /// or validation fails.
    pub fn from_env() -> ConfigResult<Self> {
        source::ConfigurationLoader::new()
            .add_source(Box::new(source::EnvironmentSource))
            .load()
    }
}

impl Validate for ApplicationConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.ollama.base_url, "ollama.base_url")?;
        validation::validate_url(&self.ollama.base_url, "ollama.base_url")?;
        validation::validate_non_empty(&self.ollama.embedding_model, "ollama.embedding_model")?;
        validation::validate_non_empty(&self.ollama.chat_model, "ollama.chat_model")?;
        validation::validate_port(self.api.port, "api.port")?;
        validation::validate_range(
            self.indexing.embedding_batch_size as u64,
            1,
            10_000,
            "indexing.embedding_batch_size",
        )?;
        Ok(())
    }
}
