//! Backend wire types

use serde::{Deserialize, Serialize};

use crate::leads::{LeadKind, LeadRecord, Platform};
use crate::utils::UNLIMITED_DAILY_LIMIT;

/// Body of `POST /scraping/ingest`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionRequest {
    pub source: Platform,
    /// Uppercased lead category, e.g. `REACTION`
    #[serde(rename = "type")]
    pub kind: String,
    pub leads: Vec<LeadRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl IngestionRequest {
    #[must_use]
    pub fn new(source: Platform, kind: LeadKind, leads: Vec<LeadRecord>) -> Self {
        Self {
            source,
            kind: kind.wire_type(),
            leads,
            idempotency_key: None,
        }
    }

    #[must_use]
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Server ids come back as strings or numbers depending on the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Text(String),
    Number(i64),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Created or existing ingestion resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub id: RecordId,
}

/// `GET /credits/scraping-limit` response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingLimit {
    /// `-1` means unlimited
    pub daily_limit: i64,
    pub daily_usage: i64,
}

/// Session-local view of the daily quota
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    Unlimited,
    Remaining(u64),
    Exhausted,
}

impl Quota {
    #[must_use]
    pub fn from_limit(limit: ScrapingLimit) -> Self {
        if limit.daily_limit == UNLIMITED_DAILY_LIMIT {
            return Self::Unlimited;
        }
        let remaining = limit.daily_limit.saturating_sub(limit.daily_usage);
        if remaining <= 0 {
            Self::Exhausted
        } else {
            Self::Remaining(remaining.unsigned_abs())
        }
    }

    #[must_use]
    pub fn is_exhausted(self) -> bool {
        self == Self::Exhausted
    }

    /// Records this session may still produce; `None` when unlimited
    #[must_use]
    pub fn ceiling(self) -> Option<u64> {
        match self {
            Self::Unlimited => None,
            Self::Remaining(n) => Some(n),
            Self::Exhausted => Some(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct UsageIncrement<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub amount: u64,
}

/// Split `records` into ingestion requests of at most `batch_size` leads
///
/// Each request gets the key `{key_prefix}-{chunk}`, stable across retries
/// and re-uploads of the same session.
#[must_use]
pub fn build_requests(
    platform: Platform,
    kind: LeadKind,
    records: &[LeadRecord],
    batch_size: usize,
    key_prefix: Option<&str>,
) -> Vec<IngestionRequest> {
    records
        .chunks(batch_size.max(1))
        .enumerate()
        .map(|(chunk, leads)| {
            let request = IngestionRequest::new(platform, kind, leads.to_vec());
            match key_prefix {
                Some(prefix) => request.with_idempotency_key(format!("{prefix}-{chunk}")),
                None => request,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_from_limits() {
        let q = |daily_limit, daily_usage| Quota::from_limit(ScrapingLimit { daily_limit, daily_usage });
        assert_eq!(q(-1, 999), Quota::Unlimited);
        assert_eq!(q(100, 40), Quota::Remaining(60));
        assert_eq!(q(100, 100), Quota::Exhausted);
        assert_eq!(q(100, 120), Quota::Exhausted);
        assert_eq!(q(0, 0).ceiling(), Some(0));
    }

    #[test]
    fn request_wire_shape() {
        let lead = LeadRecord::new("Jane", Platform::LinkedIn, LeadKind::Reaction, "https://x");
        let req = IngestionRequest::new(Platform::LinkedIn, LeadKind::Reaction, vec![lead])
            .with_idempotency_key("itest-123");
        let json = serde_json::to_value(&req).expect("serialize");
        assert_eq!(json["source"], "LINKEDIN");
        assert_eq!(json["type"], "REACTION");
        assert_eq!(json["idempotencyKey"], "itest-123");
        assert_eq!(json["leads"][0]["name"], "Jane");
    }

    #[test]
    fn batches_with_stable_keys() {
        let leads: Vec<_> = (0..5)
            .map(|i| LeadRecord::new(format!("p{i}"), Platform::WhatsApp, LeadKind::GroupMembership, "s"))
            .collect();
        let reqs = build_requests(Platform::WhatsApp, LeadKind::GroupMembership, &leads, 2, Some("abc"));
        assert_eq!(reqs.len(), 3);
        assert_eq!(reqs[2].leads.len(), 1);
        assert_eq!(reqs[1].idempotency_key.as_deref(), Some("abc-1"));
    }

    #[test]
    fn receipt_accepts_numeric_or_text_ids() {
        let a: IngestReceipt = serde_json::from_str(r#"{"id": 7, "extra": true}"#).expect("numeric");
        let b: IngestReceipt = serde_json::from_str(r#"{"id": "c1"}"#).expect("text");
        assert_eq!(a.id, RecordId::Number(7));
        assert_eq!(b.id.to_string(), "c1");
    }
}
