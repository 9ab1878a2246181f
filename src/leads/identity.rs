//! Identity normalization for dedup keys
//!
//! A lead's identity is its phone number when one is present, else its
//! profile URL, else its display name. Each form is normalized so the same
//! person rendered twice (different whitespace, tracking params, emoji) maps
//! to the same key.

use serde::{Deserialize, Serialize};

use crate::utils::clean_display_name;

/// Minimum digits for a string to count as a phone number
pub const MIN_PHONE_DIGITS: usize = 7;

/// Normalized identity of a lead within one session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum IdentityKey {
    Phone(String),
    Profile(String),
    Name(String),
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phone(p) => write!(f, "phone:{p}"),
            Self::Profile(u) => write!(f, "profile:{u}"),
            Self::Name(n) => write!(f, "name:{n}"),
        }
    }
}

/// Keep digits and a leading `+`; a `00` international prefix becomes `+`
///
/// Returns `None` when fewer than [`MIN_PHONE_DIGITS`] digits remain.
#[must_use]
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let plus = trimmed.starts_with('+');
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();

    let normalized = if plus {
        format!("+{digits}")
    } else if let Some(rest) = digits.strip_prefix("00") {
        format!("+{rest}")
    } else {
        digits
    };

    let count = normalized.chars().filter(char::is_ascii_digit).count();
    (count >= MIN_PHONE_DIGITS).then_some(normalized)
}

/// True when `text` looks like a phone number rather than a label
#[must_use]
pub fn looks_like_phone(text: &str) -> bool {
    let t = text.trim();
    if t.is_empty() {
        return false;
    }
    let digits = t.chars().filter(char::is_ascii_digit).count();
    let other = t
        .chars()
        .filter(|c| !c.is_ascii_digit() && !matches!(c, '+' | ' ' | '-' | '(' | ')' | '.' | '\u{a0}'))
        .count();
    digits >= MIN_PHONE_DIGITS && other == 0
}

/// Dedup form of a display name: cleaned, `~`/`-` prefix dropped, lowercased
#[must_use]
pub fn normalize_name(raw: &str) -> Option<String> {
    let cleaned = clean_display_name(raw);
    let stripped = cleaned
        .trim_start_matches(|c: char| c == '~' || c == '-' || c.is_whitespace())
        .to_lowercase();
    (!stripped.is_empty()).then_some(stripped)
}
