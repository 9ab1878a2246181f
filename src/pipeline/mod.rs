//! Session orchestration over the scroll driver, extractors and backend

pub mod errors;
pub mod report;
pub mod service;
pub mod session;

pub use errors::HarvestError;
pub use report::{ReportSummary, SessionReport};
pub use service::serve;
pub use session::HarvestSession;
