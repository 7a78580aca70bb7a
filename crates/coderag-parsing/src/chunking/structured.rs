//! Structured-language chunker (spec.md §4.2), first-class for C#-family
//! syntax: one chunk per `method_declaration`, with the enclosing class
//! name attached when the method is nested inside a `class_declaration`.
//!
//! Tree-sitter query capture iteration: no token-budget sub-splitting, no
//! heuristic fallback inside the chunker itself — a parse failure falls
//! back to the generic line chunker instead.

use crate::chunk::Chunk;
use chrono::{DateTime, Utc};
use tree_sitter::{Parser, Query, QueryCursor, StreamingIteratorMut};

const METHOD_QUERY: &str = r"
(class_declaration
  name: (identifier) @class.name
  body: (declaration_list
    (method_declaration
      name: (identifier) @method.name) @method.node))
(method_declaration
  name: (identifier) @method.name) @method.node
";

/// Parse `content` as C#-family source and emit one chunk per method
/// declaration, with the enclosing class name when found. Returns `None`
/// if the tree-sitter parse itself fails (the caller falls back to the
/// generic line chunker in that case, per spec.md §4.2).
///
/// If the parse succeeds but no methods are found, a single file-level
/// chunk covering the whole file is returned instead (spec.md §4.2).
#[must_use]
pub fn chunk_structured(
    file_path: &str,
    content: &str,
    language: &str,
    last_modified: DateTime<Utc>,
) -> Option<Vec<Chunk>> {
    if content.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
        .ok()?;
    let tree = parser.parse(content, None)?;
    let root = tree.root_node();

    let query = Query::new(&tree_sitter_c_sharp::LANGUAGE.into(), METHOD_QUERY).ok()?;
    let method_node_idx = query.capture_index_for_name("method.node")?;
    let method_name_idx = query.capture_index_for_name("method.name")?;
    let class_name_idx = query.capture_index_for_name("class.name")?;

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, root, content.as_bytes());

    let mut chunks = Vec::new();
    let mut seen_byte_ranges = std::collections::HashSet::new();

    while let Some(m) = matches.next_mut() {
        let method_capture = m.captures.iter().find(|c| c.index == method_node_idx)?;
        let node = method_capture.node;
        let byte_range = node.byte_range();
        if !seen_byte_ranges.insert((byte_range.start, byte_range.end)) {
            continue;
        }

        let start_line = node.start_position().row + 1;
        let end_line = node.end_position().row + 1;
        let text = &content[byte_range];

        let function_name = m
            .captures
            .iter()
            .find(|c| c.index == method_name_idx)
            .map(|c| content[c.node.byte_range()].to_string());
        let class_name = m
            .captures
            .iter()
            .find(|c| c.index == class_name_idx)
            .map(|c| content[c.node.byte_range()].to_string());

        let mut chunk = Chunk::new(
            file_path,
            text,
            start_line,
            end_line,
            last_modified,
            language,
            vec!["method".to_string()],
        );
        if let Some(name) = function_name {
            chunk = chunk.with_function_name(name);
        }
        if let Some(name) = class_name {
            chunk = chunk.with_class_name(name);
        }
        chunks.push(chunk);
    }

    if chunks.is_empty() {
        let end_line = content.lines().count().max(1);
        chunks.push(Chunk::new(
            file_path,
            content,
            1,
            end_line,
            last_modified,
            language,
            vec!["file-level".to_string()],
        ));
    }

    Some(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_method_yields_one_method_chunk() {
        let src = "class Greeter {\n    public string Foo() {\n        return \"hi\";\n    }\n}\n";
        let chunks = chunk_structured("g.cs", src, "csharp", Utc::now()).expect("parses");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].tags, vec!["method"]);
        assert_eq!(chunks[0].function_name.as_deref(), Some("Foo"));
        assert_eq!(chunks[0].class_name.as_deref(), Some("Greeter"));
        assert!(chunks[0].start_line <= chunks[0].end_line);
    }

    #[test]
    fn no_methods_yields_single_file_level_chunk() {
        let src = "namespace N {\n    public enum Color { Red, Green }\n}\n";
        let chunks = chunk_structured("c.cs", src, "csharp", Utc::now()).expect("parses");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].tags, vec!["file-level"]);
        assert!(chunks[0].function_name.is_none());
    }

    #[test]
    fn empty_file_yields_no_chunks() {
        let chunks = chunk_structured("empty.cs", "   \n", "csharp", Utc::now()).expect("parses");
        assert!(chunks.is_empty());
    }

    #[test]
    fn multiple_methods_each_get_their_own_chunk() {
        let src = "class Calc {\n    public int Add() { return 1; }\n    public int Sub() { return 2; }\n}\n";
        let chunks = chunk_structured("calc.cs", src, "csharp", Utc::now()).expect("parses");
        assert_eq!(chunks.len(), 2);
        let names: Vec<_> = chunks.iter().filter_map(|c| c.function_name.clone()).collect();
        assert!(names.contains(&"Add".to_string()));
        assert!(names.contains(&"Sub".to_string()));
    }
}
