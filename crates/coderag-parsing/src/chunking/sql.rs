//! SQL statement chunker (spec.md §4.2, "SQL chunker").
//!
//! Splits on `;` terminators while respecting `'…'`/`"…"` string literals
//! and `-- …\n` line comments, tracking a running byte/line cursor rather
//! than re-deriving line numbers by searching for statement text (DESIGN.md
//! Open Question #3 — substring search breaks on duplicate statements).

use crate::chunk::Chunk;
use chrono::{DateTime, Utc};

/// Target chunk size for SQL/database files (spec.md §4.2: "~3000 for
/// SQL/database files"). Informational only — the SQL chunker splits on
/// statement boundaries, not size, so this isn't enforced as a hard cap.
pub const TARGET_CHUNK_SIZE_CHARS: usize = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scanner {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
}

struct Statement {
    text: String,
    start_line: usize,
    end_line: usize,
}

/// Emit the statement accumulated in `current` (if non-empty once trimmed),
/// deriving `start_line` from `end_line` minus the number of newlines the
/// trimmed text itself spans — `line` already reflects every newline
/// consumed up to and including this statement, so no separate running
/// "start of statement" cursor is needed.
fn flush(current: &str, line: usize, statements: &mut Vec<Statement>) {
    let trimmed = current.trim();
    if trimmed.is_empty() {
        return;
    }
    let end_line = line;
    let start_line = end_line - trimmed.matches('\n').count();
    statements.push(Statement {
        text: trimmed.to_string(),
        start_line,
        end_line,
    });
}

/// Split `sql` into individual statements, tracking 1-based line numbers.
fn split_statements(sql: &str) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut state = Scanner::Normal;
    let mut current = String::new();
    let mut line = 1usize;

    let mut chars = sql.chars().peekable();
    while let Some(ch) = chars.next() {
        match state {
            Scanner::Normal => match ch {
                '\'' => {
                    current.push(ch);
                    state = Scanner::SingleQuoted;
                }
                '"' => {
                    current.push(ch);
                    state = Scanner::DoubleQuoted;
                }
                '-' if chars.peek() == Some(&'-') => {
                    current.push(ch);
                    current.push(chars.next().expect("peeked"));
                    state = Scanner::LineComment;
                }
                ';' => {
                    flush(&current, line, &mut statements);
                    current.clear();
                }
                '\n' => {
                    current.push(ch);
                    line += 1;
                }
                _ => current.push(ch),
            },
            Scanner::SingleQuoted => {
                current.push(ch);
                if ch == '\'' {
                    state = Scanner::Normal;
                } else if ch == '\n' {
                    line += 1;
                }
            }
            Scanner::DoubleQuoted => {
                current.push(ch);
                if ch == '"' {
                    state = Scanner::Normal;
                } else if ch == '\n' {
                    line += 1;
                }
            }
            Scanner::LineComment => {
                current.push(ch);
                if ch == '\n' {
                    line += 1;
                    state = Scanner::Normal;
                }
            }
        }
    }

    flush(&current, line, &mut statements);
    statements
}

/// Classify a statement by its leading keyword (spec.md §4.2 table),
/// skipping any leading `-- …` comment lines first.
#[must_use]
pub fn classify(statement: &str) -> &'static str {
    let mut rest = statement.trim_start();
    while rest.starts_with("--") {
        rest = match rest.find('\n') {
            Some(idx) => rest[idx + 1..].trim_start(),
            None => "",
        };
    }

    let upper = rest.to_ascii_uppercase();
    let starts = |prefix: &str| upper.starts_with(prefix);

    if starts("CREATE TABLE") {
        "table-definition"
    } else if starts("CREATE PROCEDURE") || starts("CREATE PROC ") || upper == "CREATE PROC" {
        "stored-procedure"
    } else if starts("CREATE FUNCTION") {
        "function"
    } else if starts("CREATE VIEW") {
        "view"
    } else if starts("CREATE INDEX") || starts("CREATE UNIQUE INDEX") {
        "index"
    } else if starts("ALTER TABLE") {
        "table-modification"
    } else if starts("INSERT INTO") {
        "data-insert"
    } else if starts("UPDATE") {
        "data-update"
    } else if starts("DELETE FROM") {
        "data-delete"
    } else if starts("SELECT") {
        "query"
    } else if starts("DROP") {
        "drop-statement"
    } else if starts("EXEC") {
        "execution"
    } else {
        "sql-statement"
    }
}

/// Chunk a SQL file into one `Chunk` per non-empty statement.
#[must_use]
pub fn chunk_sql(file_path: &str, content: &str, last_modified: DateTime<Utc>) -> Vec<Chunk> {
    split_statements(content)
        .into_iter()
        .map(|stmt| {
            let tag = classify(&stmt.text);
            Chunk::new(
                file_path,
                stmt.text,
                stmt.start_line,
                stmt.end_line,
                last_modified,
                "sql",
                vec![tag.to_string()],
            )
        })
        .collect()
}
