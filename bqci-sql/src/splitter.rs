//! Lexical statement splitting.
//!
//! Splits on every `;`. Semicolons inside string literals or comments are not
//! special, so a test file should keep one statement per `;`.

/// Terminates every statement produced by [`split_statements`].
pub const STATEMENT_SEPARATOR: char = ';';

/// Split file contents into trimmed, `;`-terminated statements.
///
/// Fragments that are empty after trimming (blank lines, a trailing `;`,
/// `;;`) are dropped. A file with no statements yields an empty vector.
pub fn split_statements(text: &str) -> Vec<String> {
    text.split(STATEMENT_SEPARATOR)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| format!("{}{}", fragment, STATEMENT_SEPARATOR))
        .collect()
}
