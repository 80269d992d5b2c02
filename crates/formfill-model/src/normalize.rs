//! Field name normalization shared by scoring and alias lookup.
//!
//! The mapping contract treats `first_name`, `firstName`, and `first-name`
//! as the same normalized name, so the normalizer is part of the model
//! rather than an engine detail.

use std::collections::BTreeSet;

/// Normalizes a field name for comparison.
///
/// - Trims surrounding whitespace
/// - Splits camelCase boundaries into separate words
/// - Lowercases everything
/// - Collapses separators (`_`, `-`, `.`, `/`, whitespace runs) to single spaces
pub fn normalize_name(raw: &str) -> String {
    let mut expanded = String::with_capacity(raw.len() + 4);
    let mut prev_lower = false;
    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            if prev_lower && ch.is_uppercase() {
                expanded.push(' ');
            }
            for lowered in ch.to_lowercase() {
                expanded.push(lowered);
            }
            prev_lower = ch.is_lowercase();
        } else {
            expanded.push(' ');
            prev_lower = false;
        }
    }
    expanded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Token set of a normalized field name, for set-overlap scoring.
pub fn name_tokens(raw: &str) -> BTreeSet<String> {
    normalize_name(raw)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
