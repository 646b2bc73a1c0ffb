//! Street name normalization.
//!
//! Applied symmetrically when names are written to the store and when a
//! query supplies them, so "Rue Saint-Étienne" and "RUE SAINT ETIENNE"
//! produce the same stored key.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::synonyms;

/// Punctuation that does not contribute to name matching.
static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,#'/\\\-]+").expect("valid regex"));

/// Uppercases, strips diacritics and punctuation, and collapses
/// whitespace. Does not expand abbreviations.
#[must_use]
pub fn fold(input: &str) -> String {
    let stripped: String = input.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let upper = stripped.to_uppercase();
    let no_punct = PUNCTUATION_RE.replace_all(&upper, " ");

    no_punct.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Folds the name and expands abbreviations (`ST` -> `STREET`,
/// `N` -> `NORTH`).
#[must_use]
pub fn normalize(input: &str) -> String {
    fold(input)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(synonyms::expand_token)
        .collect::<Vec<_>>()
        .join(" ")
}

/// All name forms a query should match against, most canonical first.
///
/// Empty when the name normalizes to nothing.
#[must_use]
pub fn street_variants(input: &str) -> Vec<String> {
    let mut variants = Vec::with_capacity(2);

    for candidate in [normalize(input), fold(input)] {
        if !candidate.is_empty() && !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }

    variants
}
