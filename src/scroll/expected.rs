//! Expected list size parsed from page chrome ("1,204 members")

use once_cell::sync::Lazy;
use regex::Regex;

static TOTAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d{1,3}(?:[,.\s\u{a0}\u{202f}]\d{3})+|\d{1,7})\s*(?:membres?|participants?|members?|results?|résultats?|reactions?|réactions?|comments?|commentaires?|connections?|relations?|followers?|abonnés?)\b",
    )
    .expect("Invalid expected total regex")
});

/// First "<count> <unit>" in `text`, thousands separators removed
#[must_use]
pub fn parse_expected_total(text: &str) -> Option<u64> {
    let caps = TOTAL_PATTERN.captures(text)?;
    let digits: String = caps
        .get(1)?
        .as_str()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_member_counts() {
        assert_eq!(parse_expected_total("Group · 1,204 members"), Some(1204));
        assert_eq!(parse_expected_total("Groupe · 256 membres"), Some(256));
        assert_eq!(parse_expected_total("40 participants"), Some(40));
        assert_eq!(parse_expected_total("About 12 300 results"), Some(12300));
        assert_eq!(parse_expected_total("1 member"), Some(1));
    }

    #[test]
    fn ignores_unrelated_numbers() {
        assert_eq!(parse_expected_total("Posted 3 days ago"), None);
        assert_eq!(parse_expected_total(""), None);
        assert_eq!(parse_expected_total("0 members"), None);
    }
}
