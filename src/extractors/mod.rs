//! Platform extractors
//!
//! Each extractor maps one rendered list item to lead candidates using
//! ordered selector fallbacks, and describes its list through a
//! [`ListProfile`] the pipeline uses to find, prepare and scroll it.

pub mod filters;
pub mod harvest;
pub mod linkedin;
pub mod profile;
pub mod selectors;
pub mod whatsapp;

pub use harvest::{Harvester, harvest_items};
pub use linkedin::{
    CommentsExtractor, NetworkListExtractor, ReactionsExtractor, SearchPeopleExtractor, post_url,
};
pub use profile::{ExtractContext, Extractor, ListProfile};
pub use selectors::{FieldSelector, dedupe_doubled};
pub use whatsapp::GroupMembersExtractor;

use crate::leads::{LeadKind, Platform};

/// Extractor for a platform/kind pair, if that combination exists
#[must_use]
pub fn extractor_for(platform: Platform, kind: LeadKind) -> Option<Box<dyn Extractor>> {
    match (platform, kind) {
        (Platform::LinkedIn, LeadKind::Comment) => Some(Box::new(CommentsExtractor::new())),
        (Platform::LinkedIn, LeadKind::Reaction) => Some(Box::new(ReactionsExtractor::new())),
        (Platform::LinkedIn, LeadKind::Connection) => Some(Box::new(NetworkListExtractor::connections())),
        (Platform::LinkedIn, LeadKind::Follower) => Some(Box::new(NetworkListExtractor::followers())),
        (Platform::LinkedIn, LeadKind::SearchPerson) => Some(Box::new(SearchPeopleExtractor::new())),
        (Platform::WhatsApp, LeadKind::GroupMembership) => Some(Box::new(GroupMembersExtractor::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_supported_pairs_only() {
        let ex = extractor_for(Platform::LinkedIn, LeadKind::Follower).expect("followers");
        assert_eq!(ex.kind(), LeadKind::Follower);
        assert!(extractor_for(Platform::WhatsApp, LeadKind::Comment).is_none());
    }
}
