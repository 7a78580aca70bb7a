//! The vector store (spec.md §4.5): holds chunks + embeddings and supports
//! upsert, cosine top-k search, per-file lifecycle, and file enumeration.

pub mod error;
pub mod memory;
pub mod store;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use error::{VectorDataError, VectorDataResult};
pub use memory::MemoryStore;
pub use store::{VectorStore, cosine_similarity};

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
