//! House number parsing.
//!
//! Numbers are stored as floats so they can be ordered and interpolated.
//! A single trailing apartment letter `a`..`i` becomes a tenth:
//! `"2a"` -> `2.1`, `"2b"` -> `2.2`.

use regex::Regex;
use std::sync::LazyLock;

/// Plain numeric house numbers, optionally with a decimal fraction.
static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)?$").expect("valid regex"));

/// A whole number followed by a single apartment letter.
static APARTMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)[ \t]*([a-i])$").expect("valid regex"));

/// Parses a house number token into its float form.
///
/// Returns `None` for anything that is not a plain number or a number
/// followed by one letter in `a..=i`.
#[must_use]
pub fn parse_housenumber(raw: &str) -> Option<f64> {
    let token = raw.trim().to_lowercase();

    if NUMERIC_RE.is_match(&token) {
        return token.parse::<f64>().ok().filter(|n| n.is_finite());
    }

    let caps = APARTMENT_RE.captures(&token)?;
    let base: f64 = caps[1].parse().ok()?;
    let letter = caps[2].bytes().next()?;
    let offset = f64::from(letter - b'a' + 1);

    Some(base + offset / 10.0).filter(|n| n.is_finite())
}
