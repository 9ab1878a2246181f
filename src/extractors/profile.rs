//! Extractor contract and per-list scraping profile

use chrono::{DateTime, Utc};
use scraper::ElementRef;

use crate::leads::{LeadKind, LeadRecord, Platform, SkipReason};
use crate::scroll::ListSelectors;

/// Page-level facts shared by every item of one pass
#[derive(Debug, Clone)]
pub struct ExtractContext {
    pub platform: Platform,
    pub kind: LeadKind,
    /// Page the list was scraped from
    pub source_link: String,
    /// WhatsApp group title, when known
    pub group_name: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

impl ExtractContext {
    #[must_use]
    pub fn new(platform: Platform, kind: LeadKind, source_link: impl Into<String>) -> Self {
        Self {
            platform,
            kind,
            source_link: source_link.into(),
            group_name: None,
            scraped_at: Utc::now(),
        }
    }

    /// Bare record stamped with this context
    #[must_use]
    pub fn record(&self, name: impl Into<String>) -> LeadRecord {
        let mut record = LeadRecord::new(name, self.platform, self.kind, self.source_link.clone());
        record.group_name = self.group_name.clone();
        record.timestamp = self.scraped_at;
        record
    }
}

/// Everything the pipeline needs to drive one kind of list
#[derive(Debug, Clone, Default)]
pub struct ListProfile {
    pub list: ListSelectors,
    /// Click sequences run before the first pass (e.g. open the comments)
    pub prepare: Vec<Vec<String>>,
    /// Selectors whose text may advertise the list size
    pub expected_total: Vec<String>,
    /// Selectors whose text names the surrounding group
    pub context_label: Vec<String>,
    /// Candidates carry a profile link worth enriching
    pub enrich: bool,
}

pub(crate) fn owned(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| (*s).to_string()).collect()
}

/// Turns one rendered list item into zero or more lead candidates
///
/// Extractors hold only parsed selectors; the same instance serves every pass.
pub trait Extractor: Send + Sync {
    fn platform(&self) -> Platform;

    fn kind(&self) -> LeadKind;

    fn profile(&self) -> &ListProfile;

    /// Candidates for `item`, or why it was dropped
    ///
    /// Returned records are not yet deduplicated.
    fn extract(
        &self,
        item: ElementRef<'_>,
        ctx: &ExtractContext,
    ) -> Result<Vec<LeadRecord>, SkipReason>;
}
