//! Daily quota, usage reporting and diagnostics upload

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use super::client::{BackendHttp, decode_json};
use super::errors::IngestError;
use super::types::{Quota, ScrapingLimit, UsageIncrement};
use crate::leads::{LeadKind, Platform, ScrapeDiagnostics};

pub const LIMIT_PATH: &str = "/credits/scraping-limit";
pub const USAGE_PATH: &str = "/users/increment";
pub const DIAGNOSTICS_PATH: &str = "/scraping/diagnostics";

/// Diagnostics body for `POST /scraping/diagnostics`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsReport<'a> {
    pub session_id: String,
    pub source: Platform,
    #[serde(rename = "type")]
    pub kind: LeadKind,
    pub diagnostics: &'a ScrapeDiagnostics,
}

/// Server-side accounting consulted around a session
#[async_trait]
pub trait QuotaSource: Send + Sync {
    /// Remaining daily budget
    async fn scraping_limit(&self) -> Result<Quota, IngestError>;

    /// Report consumed records; `false` on any failure
    async fn report_usage(&self, amount: u64) -> bool;

    /// Upload counters and samples; `false` on any failure
    async fn send_diagnostics(&self, report: &DiagnosticsReport<'_>) -> bool;
}

#[derive(Debug, Clone)]
pub struct QuotaClient {
    backend: BackendHttp,
}

impl QuotaClient {
    #[must_use]
    pub fn new(backend: BackendHttp) -> Self {
        Self { backend }
    }

    /// Raw limit and usage as reported by the server
    pub async fn fetch_limit(&self) -> Result<ScrapingLimit, IngestError> {
        let response = self.backend.get(LIMIT_PATH).send().await?;
        decode_json(LIMIT_PATH, response).await
    }
}

#[async_trait]
impl QuotaSource for QuotaClient {
    async fn scraping_limit(&self) -> Result<Quota, IngestError> {
        let limit = self.fetch_limit().await?;
        debug!(
            daily_limit = limit.daily_limit,
            daily_usage = limit.daily_usage,
            "Scraping limit"
        );
        Ok(Quota::from_limit(limit))
    }

    async fn report_usage(&self, amount: u64) -> bool {
        let body = UsageIncrement {
            kind: "scraping",
            amount,
        };
        match self.backend.post(USAGE_PATH).json(&body).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!("Usage report rejected: HTTP {}", response.status().as_u16());
                false
            }
            Err(e) => {
                warn!("Usage report failed: {e}");
                false
            }
        }
    }

    async fn send_diagnostics(&self, report: &DiagnosticsReport<'_>) -> bool {
        match self.backend.post(DIAGNOSTICS_PATH).json(report).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!("Diagnostics upload rejected: HTTP {}", response.status().as_u16());
                false
            }
            Err(e) => {
                debug!("Diagnostics upload failed: {e}");
                false
            }
        }
    }
}
