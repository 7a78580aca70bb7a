//! Generic size-bounded line chunker (spec.md §4.2, "Generic line chunker").
//!
//! Used for every extension the structured and SQL chunkers don't claim:
//! HTML/Razor, JS/TS/JSX/TSX, Python, JSON/XML/YAML, Markdown, plain text.

use crate::chunk::Chunk;
use chrono::{DateTime, Utc};

/// Target chunk size in characters. ~2000 for most languages, ~3000 for
/// SQL/database files (the SQL chunker measures statements, not lines, but
/// shares this constant as its budget reference in DESIGN.md).
pub const TARGET_CHUNK_SIZE_CHARS: usize = 2000;

/// Map a file extension (without the leading dot, any case) to the
/// `language` tag stored on each chunk.
#[must_use]
pub fn language_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "cs" => "csharp",
        "razor" | "cshtml" => "razor",
        "html" | "htm" => "html",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "py" => "python",
        "sql" => "sql",
        "json" => "json",
        "xml" | "csproj" | "config" => "xml",
        "yml" | "yaml" => "yaml",
        "md" | "markdown" => "markdown",
        _ => "text",
    }
}

/// Walk `content` line by line, accumulating into the current chunk; once
/// appending the next line would exceed `target_size_chars` and the current
/// chunk already holds content, emit it and start a fresh one at the next
/// line. No overlap between emitted chunks.
#[must_use]
pub fn chunk_lines(
    file_path: &str,
    content: &str,
    language: &str,
    last_modified: DateTime<Utc>,
    target_size_chars: usize,
) -> Vec<Chunk> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = content.lines().collect();
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut start_line = 1usize;

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let would_be = buf.chars().count() + line.chars().count() + 1;
        if !buf.is_empty() && would_be > target_size_chars {
            chunks.push(Chunk::new(
                file_path,
                buf.clone(),
                start_line,
                line_no - 1,
                last_modified,
                language,
                vec!["file-level".to_string()],
            ));
            buf.clear();
            start_line = line_no;
        }
        if !buf.is_empty() {
            buf.push('\n');
        }
        buf.push_str(line);
    }

    if !buf.is_empty() {
        chunks.push(Chunk::new(
            file_path,
            buf,
            start_line,
            lines.len(),
            last_modified,
            language,
            vec!["file-level".to_string()],
        ));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_yields_no_chunks() {
        assert!(chunk_lines("f.txt", "   \n  \n", "text", Utc::now(), 2000).is_empty());
    }

    #[test]
    fn single_short_file_is_one_chunk() {
        let chunks = chunk_lines("f.txt", "line one\nline two\n", "text", Utc::now(), 2000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 2);
    }

    #[test]
    fn exactly_two_target_sizes_splits_into_two_contiguous_chunks() {
        // Uniform 10-char lines (9 chars + newline in the joined text),
        // sized so the file is exactly 2x the target with no remainder.
        let line = "a".repeat(9);
        let lines_per_chunk = 200; // 200 * 10 = 2000 chars per chunk
        let total_lines = lines_per_chunk * 2;
        let content = vec![line.as_str(); total_lines].join("\n");

        let chunks = chunk_lines("f.txt", &content, "text", Utc::now(), 2000);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, chunks[1].start_line - 1);
        assert_eq!(chunks[1].end_line, total_lines);
    }

    #[test]
    fn extension_map_covers_known_languages() {
        assert_eq!(language_for_extension("CS"), "csharp");
        assert_eq!(language_for_extension("tsx"), "typescript");
        assert_eq!(language_for_extension("unknown-ext"), "text");
    }
}
