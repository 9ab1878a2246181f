//! Profile enrichment via a reused hidden frame

pub mod circuit_breaker;
pub mod enricher;
pub mod errors;
pub mod fields;
pub mod frame;

pub use circuit_breaker::{CircuitBreaker, CircuitState, HostHealth};
pub use enricher::{EnrichOutcome, ProfileEnricher};
pub use errors::EnrichError;
pub use fields::{FieldGroup, ProfileField};
pub use frame::ProfileFrame;
