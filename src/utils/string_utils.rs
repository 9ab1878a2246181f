//! Text cleanup helpers shared by the extractors and identity normalization
//!
//! Scraped labels arrive with zero-width joiners, emoji decorations and
//! ragged whitespace; these helpers turn them into comparable strings.

use once_cell::sync::Lazy;
use regex::Regex;

static ZERO_WIDTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new("[\u{200B}-\u{200F}\u{202A}-\u{202E}\u{2060}-\u{2064}\u{FEFF}]")
        .expect("Invalid zero-width regex")
});

static PICTOGRAPHIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{Extended_Pictographic}\u{FE0F}\u{1F3FB}-\u{1F3FF}]")
        .expect("Invalid pictographic regex")
});

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Collapse internal whitespace runs to one space and trim the ends
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Remove zero-width and bidi control characters
#[must_use]
pub fn strip_zero_width(s: &str) -> String {
    ZERO_WIDTH.replace_all(s, "").into_owned()
}

/// Display-clean a person name: no zero-width chars, no emoji, single spaces
#[must_use]
pub fn clean_display_name(s: &str) -> String {
    let s = strip_zero_width(s);
    let s = PICTOGRAPHIC.replace_all(&s, "");
    collapse_whitespace(&s)
}

/// Safely truncate a string to a maximum number of CHARACTERS (not bytes).
///
/// Never panics on multi-byte characters; returns the full string if it is
/// shorter than `max_chars`.
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_decorated_names() {
        assert_eq!(clean_display_name("  Ana\u{200B}  María 🌸 "), "Ana María");
        assert_eq!(clean_display_name("👍🏽 Bob"), "Bob");
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(safe_truncate_chars("héllo", 2), "hé");
        assert_eq!(safe_truncate_chars("hi", 10), "hi");
    }
}
