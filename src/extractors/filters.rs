//! Placeholder and noise filters applied before a candidate is kept

use once_cell::sync::Lazy;
use regex::Regex;

static AUDIO_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(msg-audio|msg-video|voice note|voice message|message vocal|note vocale)")
        .expect("Invalid audio row regex")
});

static PHONE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d{7,}").expect("Invalid phone run regex"));

static HAS_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{L}").expect("Invalid letter regex"));

/// Voice notes and media rows that leak into member lists
#[must_use]
pub fn is_audio_label(label: &str) -> bool {
    AUDIO_ROW.is_match(label)
}

/// Anonymized or upsell entries that are not real people
#[must_use]
pub fn is_placeholder_name(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    lower.starts_with("linkedin member")
        || lower.starts_with("membre linkedin")
        || lower.contains("switch_search_vertical")
}

/// Fewer than two visible characters
#[must_use]
pub fn is_short_name(name: &str) -> bool {
    name.trim().chars().count() < 2
}

#[must_use]
pub fn has_letter(text: &str) -> bool {
    HAS_LETTER.is_match(text)
}

/// Phone-like runs in `text` once common separators are removed
#[must_use]
pub fn phone_runs(text: &str) -> Vec<String> {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '.' | '\u{a0}'))
        .collect();
    PHONE_RUN
        .find_iter(&compact)
        .map(|m| m.as_str().to_string())
        .collect()
}
