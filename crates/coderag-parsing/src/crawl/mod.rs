//! Crawler (spec.md §4.3): enumerates files under a root, applies
//! binary/exclusion filters, and dispatches each file to the appropriate
//! chunker.
//!
//! `scan`/`process` and their helpers are plain synchronous functions, not
//! `async fn`s — they do blocking I/O directly. Callers on an async runtime
//! must run them inside `tokio::task::spawn_blocking` (see
//! `coderag_indexing::indexer` and the API's `indexing::files`/`browse`
//! handlers); this module has no runtime dependency of its own to do that
//! itself.

use crate::chunk::Chunk;
use crate::chunking;
use crate::detect::ProjectType;
use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Files larger than this are rejected rather than read (spec.md §4.3:
/// "rejecting files larger than ~1 MiB").
const MAX_FILE_SIZE_BYTES: u64 = 1024 * 1024;

const BINARY_EXTENSIONS: &[&str] = &[
    "dll", "pdb", "bin", "png", "jpg", "jpeg", "gif", "ico", "zip", "7z", "tar", "gz", "pdf",
    "doc", "docx", "xls", "xlsx",
];

const IMPLICIT_EXCLUDES: &[&str] = &["\\bin\\", "\\obj\\", "\\.git\\", "\\node_modules\\"];

fn has_excluded_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| BINARY_EXTENSIONS.iter().any(|b| b.eq_ignore_ascii_case(ext)))
}

fn matches_exclude_pattern(path: &Path, exclude_patterns: &[String]) -> bool {
    // Normalize to a form with backslash separators on both sides so the
    // `\bin\`-style implicit excludes match on every platform.
    let normalized = path.to_string_lossy().replace('/', "\\");
    let normalized_lower = normalized.to_ascii_lowercase();

    for pattern in IMPLICIT_EXCLUDES {
        if normalized_lower.contains(&pattern.to_ascii_lowercase()) {
            return true;
        }
    }
    for pattern in exclude_patterns {
        if normalized_lower.contains(&pattern.to_ascii_lowercase()) {
            return true;
        }
    }
    false
}

/// Lazily, deterministically enumerate every non-excluded, non-binary file
/// under `root`.
pub fn scan(root: &Path, exclude_patterns: &[String]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let walker = WalkBuilder::new(root).hidden(false).build();
    for entry in walker.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if has_excluded_extension(path) {
            continue;
        }
        if matches_exclude_pattern(path, exclude_patterns) {
            continue;
        }
        out.push(path.to_path_buf());
    }
    out.sort();
    out
}

fn file_last_modified(path: &Path) -> DateTime<Utc> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "could not read mtime, using now()");
            Utc::now()
        })
}

/// Read `path` as UTF-8 text, best-effort-detecting non-UTF-8 encodings
/// via BOM / NUL-byte heuristics before falling back to `encoding_rs`.
fn read_text(path: &Path) -> Option<String> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to read file");
            return None;
        }
    };
    if bytes.contains(&0) {
        // Binary content slipped past the extension filter; not a text file.
        return None;
    }
    let (decoded, _, had_errors) = encoding_rs::UTF_8.decode(&bytes);
    if had_errors {
        let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
        Some(decoded.into_owned())
    } else {
        Some(decoded.into_owned())
    }
}

/// Process a single file into its chunks, tagging every chunk with the
/// file's UTC mtime. Empty/whitespace-only files and files over the size
/// cap yield zero chunks; I/O errors are logged and also yield zero chunks
/// (spec.md §4.3).
#[must_use]
pub fn process(path: &Path) -> Vec<Chunk> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_string();

    if extension.eq_ignore_ascii_case("exe") {
        return vec![synthetic_exe_chunk(path)];
    }

    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to stat file");
            return Vec::new();
        }
    };
    if metadata.len() > MAX_FILE_SIZE_BYTES {
        tracing::warn!(path = %path.display(), size = metadata.len(), "file exceeds size cap, skipping");
        return Vec::new();
    }

    let Some(content) = read_text(path) else {
        return Vec::new();
    };
    if content.trim().is_empty() {
        return Vec::new();
    }

    let last_modified = file_last_modified(path);
    let file_path = path.to_string_lossy().into_owned();
    chunking::chunk_file(&file_path, &content, &extension, last_modified)
}

/// A synthetic metadata-only chunk for `.exe` files: no content is read,
/// per spec.md §4.2's "Binary-exe handling".
fn synthetic_exe_chunk(path: &Path) -> Chunk {
    let metadata = std::fs::metadata(path).ok();
    let size = metadata.as_ref().map(std::fs::Metadata::len).unwrap_or(0);
    let last_modified = metadata
        .as_ref()
        .and_then(|m| m.modified().ok())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(Utc::now);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content = format!(
        "binary executable: name={name} path={} size={size} bytes",
        path.display()
    );
    Chunk::new(
        path.to_string_lossy().into_owned(),
        content,
        1,
        1,
        last_modified,
        "binary",
        vec!["binary-metadata".to_string()],
    )
}

/// A capability bundle for project-type-aware crawling. The SQL crawler is
/// the sole true specialization (spec.md §4.3's closing paragraph); every
/// other archetype reuses the generic behavior of `scan`/`process` above.
pub trait Crawler: Send + Sync {
    fn scan(&self, root: &Path, exclude_patterns: &[String]) -> Vec<PathBuf>;
    fn process(&self, path: &Path) -> Vec<Chunk>;
}

/// Reused by every archetype except `SqlDatabase`.
pub struct GenericCrawler;

impl Crawler for GenericCrawler {
    fn scan(&self, root: &Path, exclude_patterns: &[String]) -> Vec<PathBuf> {
        scan(root, exclude_patterns)
    }

    fn process(&self, path: &Path) -> Vec<Chunk> {
        process(path)
    }
}

/// Scans only `*.sql` (and other database-marker) files, routing
/// everything through the SQL chunker.
pub struct SqlCrawler;

const DATABASE_EXTENSIONS: &[&str] = &["sql"];

impl Crawler for SqlCrawler {
    fn scan(&self, root: &Path, exclude_patterns: &[String]) -> Vec<PathBuf> {
        scan(root, exclude_patterns)
            .into_iter()
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| DATABASE_EXTENSIONS.iter().any(|d| d.eq_ignore_ascii_case(ext)))
            })
            .collect()
    }

    fn process(&self, path: &Path) -> Vec<Chunk> {
        process(path)
    }
}

/// Returns the specialized crawler for `project_type`; only `SqlDatabase`
/// gets a true specialization (spec.md §4.3).
#[must_use]
pub fn crawler_for(project_type: ProjectType) -> Box<dyn Crawler> {
    match project_type {
        ProjectType::SqlDatabase => Box::new(SqlCrawler),
        _ => Box::new(GenericCrawler),
    }
}
