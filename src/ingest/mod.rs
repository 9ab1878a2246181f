//! Backend ingestion: batches, retries, quota and usage accounting

pub mod client;
pub mod errors;
pub mod policy;
pub mod quota;
pub mod types;

pub use client::{BackendHttp, INGEST_PATH, IngestionClient, LeadSink};
pub use errors::IngestError;
pub use policy::RetryPolicy;
pub use quota::{DIAGNOSTICS_PATH, DiagnosticsReport, LIMIT_PATH, QuotaClient, QuotaSource, USAGE_PATH};
pub use types::{IngestReceipt, IngestionRequest, Quota, RecordId, ScrapingLimit, build_requests};
