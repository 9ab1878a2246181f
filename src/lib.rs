//! Lead harvesting from virtualized social lists
//!
//! A [`pipeline::HarvestSession`] scrolls one list through a
//! [`scroll::ScrollSurface`], turns rendered rows into deduplicated
//! [`leads::LeadRecord`]s, optionally enriches them from profile pages, and
//! ships them to the backend with idempotent, retried batches. Progress and
//! lifecycle events flow over the [`messaging::Messenger`] bus.

pub mod browser;
pub mod config;
pub mod enrich;
pub mod extractors;
pub mod ingest;
pub mod leads;
pub mod messaging;
pub mod pacing;
pub mod pipeline;
pub mod scroll;
pub mod session;
pub mod testing;
pub mod utils;
pub mod wait;

pub use config::{HarvestConfig, HarvestConfigBuilder};
pub use enrich::{ProfileEnricher, ProfileFrame};
pub use extractors::{Extractor, extractor_for};
pub use ingest::{IngestionClient, LeadSink, QuotaClient, QuotaSource};
pub use leads::{DedupStore, IdentityKey, LeadKind, LeadRecord, Platform};
pub use messaging::{Envelope, Messenger};
pub use pipeline::{HarvestSession, SessionReport, serve};
pub use scroll::{ScrollSurface, VirtualizedScrollDriver};
pub use session::{DoneReason, ScrapeController, SessionStatus};
