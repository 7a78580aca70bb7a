//! Chunking strategies (spec.md §4.2): structured-language, SQL, and the
//! generic size-bounded line chunker that backstops everything else.

pub mod generic;
pub mod sql;
pub mod structured;

use crate::chunk::Chunk;
use chrono::{DateTime, Utc};

/// Extensions the structured (C#-family) chunker claims.
const STRUCTURED_EXTENSIONS: &[&str] = &["cs", "csx"];

/// Extensions the SQL chunker claims.
const SQL_EXTENSIONS: &[&str] = &["sql"];

/// Dispatch `content` to the appropriate chunker by file extension,
/// falling back to the generic line chunker when a specialized chunker
/// declines (parse failure) or isn't a match for the extension.
#[must_use]
pub fn chunk_file(
    file_path: &str,
    content: &str,
    extension: &str,
    last_modified: DateTime<Utc>,
) -> Vec<Chunk> {
    let ext_lower = extension.to_ascii_lowercase();
    let language = generic::language_for_extension(&ext_lower);

    if STRUCTURED_EXTENSIONS.contains(&ext_lower.as_str())
        && let Some(chunks) = structured::chunk_structured(file_path, content, language, last_modified)
    {
        return chunks;
    }

    if SQL_EXTENSIONS.contains(&ext_lower.as_str()) {
        return sql::chunk_sql(file_path, content, last_modified);
    }

    generic::chunk_lines(
        file_path,
        content,
        language,
        last_modified,
        generic::TARGET_CHUNK_SIZE_CHARS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cs_files_use_structured_chunker() {
        let src = "class C { public void M() {} }";
        let chunks = chunk_file("f.cs", src, "cs", Utc::now());
        assert_eq!(chunks[0].language, "csharp");
    }

    #[test]
    fn sql_files_use_sql_chunker() {
        let chunks = chunk_file("f.sql", "SELECT 1;", "sql", Utc::now());
        assert_eq!(chunks[0].tags, vec!["query"]);
    }

    #[test]
    fn other_extensions_use_generic_chunker() {
        let chunks = chunk_file("f.py", "print('hi')\n", "py", Utc::now());
        assert_eq!(chunks[0].language, "python");
    }
}
