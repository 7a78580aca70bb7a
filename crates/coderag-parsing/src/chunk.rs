//! The `Chunk` domain type — the unit of retrieval (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A contiguous slice of one source file, plus whatever metadata its
/// chunker could recover (method/class names, classification tags) and
/// the embedding assigned to it once the indexer has run it through the
/// embedding client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable id, deterministically derived from `(file_path, start_line,
    /// end_line)` — see DESIGN.md "Chunk identity". Re-chunking an
    /// unchanged span always produces the same id, so `upsert` naturally
    /// deduplicates across re-scans.
    pub id: String,
    pub file_path: String,
    pub file_name: String,
    pub content: String,
    /// 1-based, inclusive.
    pub start_line: usize,
    /// 1-based, inclusive.
    pub end_line: usize,
    pub last_modified: DateTime<Utc>,
    /// Absent until the indexer's embedding pass assigns it.
    pub embedding: Option<Vec<f32>>,
    pub language: String,
    pub function_name: Option<String>,
    pub class_name: Option<String>,
    pub tags: Vec<String>,
}

impl Chunk {
    /// Derive the deterministic id for a `(file_path, start_line, end_line)`
    /// triple. Exposed so the vector store and indexer can look a chunk up
    /// by identity without constructing a full `Chunk`.
    #[must_use]
    pub fn derive_id(file_path: &str, start_line: usize, end_line: usize) -> String {
        let key = format!("{file_path}:{start_line}:{end_line}");
        Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes()).to_string()
    }

    /// Build a chunk, deriving `id` and `file_name` from `file_path`.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        file_path: impl Into<String>,
        content: impl Into<String>,
        start_line: usize,
        end_line: usize,
        last_modified: DateTime<Utc>,
        language: impl Into<String>,
        tags: Vec<String>,
    ) -> Self {
        let file_path = file_path.into();
        let id = Self::derive_id(&file_path, start_line, end_line);
        let file_name = std::path::Path::new(&file_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.clone());
        Self {
            id,
            file_path,
            file_name,
            content: content.into(),
            start_line,
            end_line,
            last_modified,
            embedding: None,
            language: language.into(),
            function_name: None,
            class_name: None,
            tags,
        }
    }

    #[must_use]
    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = Some(name.into());
        self
    }
}

/// A single top-k retrieval hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    /// Cosine similarity, in `[-1, 1]`.
    pub similarity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_id_is_stable_and_location_sensitive() {
        let a = Chunk::derive_id("/src/a.cs", 1, 10);
        let b = Chunk::derive_id("/src/a.cs", 1, 10);
        let c = Chunk::derive_id("/src/a.cs", 1, 11);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn new_derives_file_name_from_path() {
        let chunk = Chunk::new(
            "/repo/src/Foo.cs",
            "class Foo {}",
            1,
            1,
            Utc::now(),
            "csharp",
            vec!["file-level".to_string()],
        );
        assert_eq!(chunk.file_name, "Foo.cs");
        assert_eq!(chunk.id, Chunk::derive_id("/repo/src/Foo.cs", 1, 1));
    }
}
