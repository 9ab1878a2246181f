use serde::Serialize;
use uuid::Uuid;

use crate::ingest::{IngestError, IngestReceipt};
use crate::leads::{LeadRecord, ScrapeDiagnostics};
use crate::scroll::ScrollOutcome;
use crate::session::DoneReason;

/// Everything one session produced
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub reason: DoneReason,
    /// Accepted records in processing order; kept even if ingestion failed
    pub records: Vec<LeadRecord>,
    pub diagnostics: ScrapeDiagnostics,
    pub scroll: Option<ScrollOutcome>,
    pub receipts: Vec<IngestReceipt>,
    /// First ingestion failure; later batches were not attempted
    pub ingest_error: Option<IngestError>,
    /// The page went away or a script failed mid-pass
    pub surface_error: Option<String>,
}

impl SessionReport {
    pub(crate) fn empty(session_id: Uuid, reason: DoneReason) -> Self {
        Self {
            session_id,
            reason,
            records: Vec::new(),
            diagnostics: ScrapeDiagnostics::new(),
            scroll: None,
            receipts: Vec::new(),
            ingest_error: None,
            surface_error: None,
        }
    }

    /// Compact form for printing from the CLI
    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            session_id: self.session_id.to_string(),
            reason: self.reason,
            records: self.records.len(),
            batches: self.receipts.len(),
            scanned: self.diagnostics.scanned,
            skipped: self.diagnostics.total_skipped(),
            duplicates: self.diagnostics.duplicates,
            ingest_error: self.ingest_error.as_ref().map(ToString::to_string),
            surface_error: self.surface_error.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub session_id: String,
    pub reason: DoneReason,
    pub records: usize,
    pub batches: usize,
    pub scanned: u64,
    pub skipped: u64,
    pub duplicates: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingest_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_error: Option<String>,
}
