//! Idempotent, retrying ingestion client
//!
//! The idempotency key travels as both the `Idempotency-Key` header and the
//! `idempotencyKey` body field, and stays the same across retries. The
//! server decides whether a call created a row or matched an existing one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::errors::IngestError;
use super::policy::RetryPolicy;
use super::types::{IngestReceipt, IngestionRequest};
use crate::config::HarvestConfig;
use crate::utils::is_valid_url;

pub const INGEST_PATH: &str = "/scraping/ingest";

/// Destination for finished batches
#[async_trait]
pub trait LeadSink: Send + Sync {
    async fn ingest(&self, request: &IngestionRequest) -> Result<IngestReceipt, IngestError>;
}

/// Base URL, bearer token and a pooled HTTP client shared by backend calls
#[derive(Debug, Clone)]
pub struct BackendHttp {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl BackendHttp {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, IngestError> {
        if !is_valid_url(base_url) {
            return Err(IngestError::Config(format!("invalid backend url '{base_url}'")));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn from_config(config: &HarvestConfig) -> Result<Self, IngestError> {
        Self::new(
            &config.backend().base_url,
            config.backend().token.clone(),
            config.request_timeout(),
        )
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.post(self.url(path)))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Map a non-2xx response to `IngestError::Status`, otherwise decode JSON
pub(crate) async fn decode_json<T: DeserializeOwned>(
    endpoint: &str,
    response: Response,
) -> Result<T, IngestError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IngestError::Status {
            endpoint: endpoint.to_string(),
            code: status.as_u16(),
            body,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| IngestError::Decode(e.to_string()))
}

/// `LeadSink` over `POST /scraping/ingest`
#[derive(Debug, Clone)]
pub struct IngestionClient {
    backend: BackendHttp,
    policy: RetryPolicy,
}

impl IngestionClient {
    #[must_use]
    pub fn new(backend: BackendHttp, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn from_config(config: &HarvestConfig) -> Result<Self, IngestError> {
        Ok(Self::new(
            BackendHttp::from_config(config)?,
            RetryPolicy::from_config(config.backend()),
        ))
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Deliver `request`, retrying transient failures per the policy
    pub async fn send(&self, request: &IngestionRequest) -> Result<IngestReceipt, IngestError> {
        let mut retry = 0;
        loop {
            match self.attempt(request).await {
                Ok(receipt) => {
                    info!(
                        id = %receipt.id,
                        leads = request.leads.len(),
                        key = request.idempotency_key.as_deref().unwrap_or("-"),
                        "Batch ingested"
                    );
                    return Ok(receipt);
                }
                Err(e) if e.is_retryable() && self.policy.allows(retry) => {
                    let delay = self.policy.backoff(retry);
                    warn!(attempt = retry + 1, ?delay, "Ingestion failed, retrying: {e}");
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => {
                    warn!(attempts = retry + 1, "Ingestion failed: {e}");
                    return Err(e);
                }
            }
        }
    }

    async fn attempt(&self, request: &IngestionRequest) -> Result<IngestReceipt, IngestError> {
        let mut builder = self.backend.post(INGEST_PATH).json(request);
        if let Some(key) = &request.idempotency_key {
            builder = builder.header("Idempotency-Key", key);
        }
        debug!(url = %self.backend.url(INGEST_PATH), "POST ingestion batch");
        let response = builder.send().await?;
        decode_json(INGEST_PATH, response).await
    }
}

#[async_trait]
impl LeadSink for IngestionClient {
    async fn ingest(&self, request: &IngestionRequest) -> Result<IngestReceipt, IngestError> {
        self.send(request).await
    }
}
