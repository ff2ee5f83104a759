//! Translation of a [`SearchQuery`] into the engine's query grammar
//!
//! The output has the shape `<scope> <mode><"keyword">`:
//! - scope: `ancestor:` followed by the scope paths joined with `|`, or empty
//! - mode: `file: `, `folder: `, or empty
//! - keyword: the raw keyword with operator characters removed, in quotes

use super::types::SearchQuery;
use std::path::PathBuf;

/// Characters with operator meaning in the engine grammar
const OPERATOR_CHARS: [char; 6] = ['"', '*', '?', '<', '>', '|'];

/// Translate a query into engine search text
pub fn translate_query(query: &SearchQuery) -> String {
    let keyword = strip_operators(query.keywords());
    let scope = scope_clause(query.scope().unwrap_or_default());
    let mode = query.mode().query_prefix();

    format!("{} {}\"{}\"", scope, mode, keyword)
}

/// Remove operator characters so the keyword is matched literally
pub fn strip_operators(raw: &str) -> String {
    raw.chars().filter(|c| !OPERATOR_CHARS.contains(c)).collect()
}

/// Build the `ancestor:` clause restricting a search to directory trees
pub fn scope_clause(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return String::new();
    }

    let joined = paths
        .iter()
        .map(|p| p.to_string_lossy())
        .collect::<Vec<_>>()
        .join("|");

    format!("ancestor:{}", joined)
}
