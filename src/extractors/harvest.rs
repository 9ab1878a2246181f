//! Turning rendered item HTML into deduplicated lead records

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use scraper::{ElementRef, Html};
use tracing::debug;

use super::profile::{ExtractContext, Extractor};
use crate::leads::{DedupStore, LeadRecord, ScrapeDiagnostics, SkipReason};
use crate::utils::collapse_whitespace;

/// Run `extractor` over `items` in DOM order, keeping only new identities
///
/// Every candidate is test-and-inserted into `store` atomically before it is
/// returned, so overlapping passes never yield the same identity twice.
pub fn harvest_items(
    extractor: &dyn Extractor,
    ctx: &ExtractContext,
    store: &DedupStore,
    diagnostics: &mut ScrapeDiagnostics,
    items: &[String],
) -> Vec<LeadRecord> {
    let mut accepted = Vec::new();
    for raw in items {
        let fragment = Html::parse_fragment(raw);
        let Some(item) = fragment.root_element().children().find_map(ElementRef::wrap) else {
            continue;
        };
        diagnostics.record_scanned();
        let label = collapse_whitespace(&item.text().collect::<Vec<_>>().join(" "));

        let candidates = match extractor.extract(item, ctx) {
            Ok(candidates) => candidates,
            Err(reason) => {
                diagnostics.record_skip(reason, &label);
                continue;
            }
        };

        for record in candidates {
            let Some(key) = record.identity_key() else {
                diagnostics.record_skip(SkipReason::InvalidIdentity, &label);
                continue;
            };
            if store.insert_if_new(key) {
                diagnostics.record_extracted(&record.name);
                accepted.push(record);
            } else {
                diagnostics.record_duplicate();
            }
        }
    }
    accepted
}

/// Stateful wrapper used across scroll iterations of one pass
///
/// Remembers which item markup it has already examined so rows that stay
/// rendered between iterations are not re-counted in diagnostics.
pub struct Harvester<'a> {
    extractor: &'a dyn Extractor,
    ctx: ExtractContext,
    store: &'a DedupStore,
    diagnostics: ScrapeDiagnostics,
    examined: HashSet<u64>,
}

impl<'a> Harvester<'a> {
    pub fn new(extractor: &'a dyn Extractor, ctx: ExtractContext, store: &'a DedupStore) -> Self {
        Self {
            extractor,
            ctx,
            store,
            diagnostics: ScrapeDiagnostics::new(),
            examined: HashSet::new(),
        }
    }

    pub fn context(&self) -> &ExtractContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ExtractContext {
        &mut self.ctx
    }

    pub fn diagnostics(&self) -> &ScrapeDiagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> ScrapeDiagnostics {
        self.diagnostics
    }

    /// New records among `items`, in the order they were rendered
    pub fn harvest(&mut self, items: &[String]) -> Vec<LeadRecord> {
        let fresh: Vec<String> = items
            .iter()
            .filter(|raw| self.examined.insert(fingerprint(raw)))
            .cloned()
            .collect();
        if fresh.is_empty() {
            return Vec::new();
        }
        let records = harvest_items(self.extractor, &self.ctx, self.store, &mut self.diagnostics, &fresh);
        debug!(
            rendered = items.len(),
            fresh = fresh.len(),
            accepted = records.len(),
            "Harvested rendered items"
        );
        records
    }

    /// Forget examined markup; the dedup store is cleared separately
    pub fn reset(&mut self) {
        self.examined.clear();
        self.diagnostics = ScrapeDiagnostics::new();
    }
}

fn fingerprint(raw: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    raw.hash(&mut hasher);
    hasher.finish()
}
