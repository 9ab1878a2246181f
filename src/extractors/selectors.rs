//! Prioritized CSS selector fallbacks per field
//!
//! Target sites rename classes often, so each field carries several
//! strategies and the first one yielding a non-empty value wins.

use scraper::{ElementRef, Selector};
use tracing::warn;

use crate::utils::collapse_whitespace;

#[derive(Debug, Clone)]
enum Source {
    Text,
    Attr(&'static str),
}

/// Ordered selector chain for one field
#[derive(Debug, Clone)]
pub struct FieldSelector {
    name: &'static str,
    chain: Vec<Selector>,
    source: Source,
}

/// Parse every selector, dropping (and logging) the invalid ones
#[must_use]
pub fn parse_all(field: &str, selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|raw| match Selector::parse(raw) {
            Ok(sel) => Some(sel),
            Err(e) => {
                warn!(field, selector = raw, "Skipping invalid selector: {e:?}");
                None
            }
        })
        .collect()
}

impl FieldSelector {
    /// Read trimmed, whitespace-collapsed text content
    #[must_use]
    pub fn text(name: &'static str, selectors: &[&str]) -> Self {
        Self {
            name,
            chain: parse_all(name, selectors),
            source: Source::Text,
        }
    }

    /// Read an attribute value
    #[must_use]
    pub fn attr(name: &'static str, selectors: &[&str], attr: &'static str) -> Self {
        Self {
            name,
            chain: parse_all(name, selectors),
            source: Source::Attr(attr),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// First non-empty value, trying the scope itself before its descendants
    #[must_use]
    pub fn first(&self, scope: ElementRef<'_>) -> Option<String> {
        self.chain.iter().find_map(|sel| {
            std::iter::once(scope)
                .filter(|el| sel.matches(el))
                .chain(scope.select(sel))
                .find_map(|el| self.read(el))
        })
    }

    /// Every non-empty value across the whole chain, in order, deduplicated
    #[must_use]
    pub fn all(&self, scope: ElementRef<'_>) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for sel in &self.chain {
            for el in scope.select(sel) {
                if let Some(v) = self.read(el)
                    && !out.contains(&v)
                {
                    out.push(v);
                }
            }
        }
        out
    }

    fn read(&self, el: ElementRef<'_>) -> Option<String> {
        let raw = match self.source {
            Source::Text => collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")),
            Source::Attr(attr) => el.value().attr(attr)?.trim().to_string(),
        };
        (!raw.is_empty()).then_some(raw)
    }
}

/// Text of a node with nested duplicate labels collapsed
///
/// LinkedIn renders names twice (visible + visually-hidden). Text nodes are
/// joined with spaces, so an exact word-level doubling keeps one copy.
#[must_use]
pub fn dedupe_doubled(text: &str) -> String {
    let t = text.trim();
    let words: Vec<&str> = t.split(' ').collect();
    if words.len() >= 2 && words.len() % 2 == 0 {
        let (a, b) = words.split_at(words.len() / 2);
        if a == b {
            return a.join(" ");
        }
    }
    t.to_string()
}
