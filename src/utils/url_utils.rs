//! URL helpers for profile links scraped from list items.

use url::Url;

/// Check if a URL is an absolute http(s) URL
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Resolve a possibly-relative `href` against `base`
///
/// Returns `None` for empty, script, mail and data links.
#[must_use]
pub fn resolve_link(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href == "#" {
        return None;
    }
    if is_valid_url(href) {
        return Some(href.to_string());
    }
    if href.contains(':') && !href.starts_with('/') {
        return None;
    }
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(String::from)
}

/// Canonical form of a profile URL used as an identity key
///
/// Lowercases the host, drops a leading `www.`, the query, the fragment and
/// any trailing slash. Relative links are resolved against `base` first.
#[must_use]
pub fn normalize_profile_url(base: &str, href: &str) -> Option<String> {
    let absolute = resolve_link(base, href)?;
    let url = Url::parse(&absolute).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let path = url.path().trim_end_matches('/');
    Some(format!("{host}{path}"))
}

/// Host of a URL, lowercased, or `None` if it does not parse
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_profile_links() {
        assert_eq!(
            resolve_link("https://www.linkedin.com", "/in/jane-doe/?miniProfile=1").as_deref(),
            Some("https://www.linkedin.com/in/jane-doe/?miniProfile=1")
        );
        assert_eq!(resolve_link("https://www.linkedin.com", "javascript:void(0)"), None);
        assert_eq!(resolve_link("https://www.linkedin.com", "   "), None);
    }

    #[test]
    fn normalizes_equivalent_profile_urls() {
        let a = normalize_profile_url("https://www.linkedin.com", "https://WWW.LinkedIn.com/in/jane/");
        let b = normalize_profile_url("https://www.linkedin.com", "/in/jane?trk=abc#x");
        assert_eq!(a.as_deref(), Some("linkedin.com/in/jane"));
        assert_eq!(a, b);
    }
}
