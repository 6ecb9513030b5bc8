//! Internal helpers for input normalization.
//!
//! These utilities are **not** part of the public API.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

/// Trim a required display name, rejecting empty values.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Comparison key for category names: NFKD, combining marks dropped,
/// lowercased, inner whitespace collapsed.
pub(crate) fn normalize_category_key(value: &str) -> String {
    let folded: String = value
        .trim()
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
