//! Session-scoped seen-set for lead identities

use dashmap::DashSet;

use super::identity::IdentityKey;

/// Tracks identity keys already accepted in the current session.
///
/// `insert_if_new` is a single atomic test-and-insert, so overlapping passes
/// over the same list cannot both accept one identity.
#[derive(Debug, Default)]
pub struct DedupStore {
    seen: DashSet<IdentityKey>,
}

impl DedupStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key`; returns `true` only the first time it is seen
    pub fn insert_if_new(&self, key: IdentityKey) -> bool {
        self.seen.insert(key)
    }

    #[must_use]
    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.seen.contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Forget everything; called on restart and navigation reset
    pub fn clear(&self) {
        self.seen.clear();
    }
}
