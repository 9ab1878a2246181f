//! Lead records, identity keys and session dedup
//!
//! A `LeadRecord` is the unit that flows from the extractors through the
//! messenger to the ingestion client. `DedupStore` guarantees no two records
//! in one session share an `IdentityKey`.

pub mod dedup;
pub mod diagnostics;
pub mod identity;
pub mod record;

pub use dedup::DedupStore;
pub use diagnostics::{DiagnosticSample, ScrapeDiagnostics, SkipCounts, SkipReason};
pub use identity::{IdentityKey, looks_like_phone, normalize_name, normalize_phone};
pub use record::{LeadKind, LeadRecord, Platform};
