/// Repository module
///
/// This module provides the data access layer for the application.
/// It contains functions for interacting with the database: categories,
/// tags, items with their tag links, user accounts and their tokens.
///
/// Functions take a `&DbPool`, check out one connection per operation and
/// return `anyhow::Result`, except for item writes which report their
/// recoverable failures through [`ItemWriteError`].

mod category_repo;
mod tag_repo;
mod item_repo;
mod user_repo;

// Re-export all repository functions
pub use category_repo::*;
pub use tag_repo::*;
pub use item_repo::*;
pub use user_repo::*;

/// Escapes `LIKE` wildcards so user input only ever matches literally
///
/// Patterns built from the result must be used with `.escape('\\')`.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `LIKE` pattern matching `term` anywhere in the column
pub(crate) fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}
