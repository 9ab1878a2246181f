//! Typed envelope exchanged between the scraper and UI contexts
//!
//! Wire form:
//! `{ "source": "scraper"|"scraper-ui", "type": "SCRAPE_…", "payload": { "type": …, … } }`

use serde::{Deserialize, Serialize};

use crate::leads::{LeadKind, LeadRecord};
use crate::session::{DoneReason, SessionStatus};

/// Which world sent the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageSource {
    #[serde(rename = "scraper")]
    Scraper,
    #[serde(rename = "scraper-ui")]
    ScraperUi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    ScrapeStart,
    ScrapePause,
    ScrapeResume,
    ScrapeStop,
    ScrapeRestart,
    ScrapeProgress,
    ScrapeProgressCount,
    ScrapeDone,
}

impl MessageType {
    /// Commands flow UI → scraper; everything else flows the other way
    #[must_use]
    pub fn is_command(self) -> bool {
        matches!(
            self,
            Self::ScrapeStart
                | Self::ScrapePause
                | Self::ScrapeResume
                | Self::ScrapeStop
                | Self::ScrapeRestart
        )
    }
}

/// Record payload: one record for progress, the full set for done
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadData {
    Records(Vec<LeadRecord>),
    Record(Box<LeadRecord>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    /// Lead category the message concerns, e.g. `reaction`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PayloadData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<DoneReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
}

impl Payload {
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            index: None,
            total: None,
            data: None,
            processed: None,
            paused: None,
            reason: None,
            status: None,
        }
    }

    /// Lead kind named by `type`, if it is one
    #[must_use]
    pub fn lead_kind(&self) -> Option<LeadKind> {
        self.kind.parse().ok()
    }

    /// Records carried in `data`, whichever shape was sent
    #[must_use]
    pub fn records(&self) -> Vec<LeadRecord> {
        match &self.data {
            Some(PayloadData::Records(records)) => records.clone(),
            Some(PayloadData::Record(record)) => vec![record.as_ref().clone()],
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub source: MessageSource,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub payload: Payload,
}

impl Envelope {
    /// UI command addressed to the scraper
    #[must_use]
    pub fn command(kind: MessageType, lead_kind: LeadKind) -> Self {
        Self {
            source: MessageSource::ScraperUi,
            kind,
            payload: Payload::new(lead_kind.as_str()),
        }
    }

    /// One newly accepted record, with its 1-based position
    #[must_use]
    pub fn progress(lead_kind: LeadKind, index: u64, total: Option<u64>, record: LeadRecord) -> Self {
        let mut payload = Payload::new(lead_kind.as_str());
        payload.index = Some(index);
        payload.total = total;
        payload.data = Some(PayloadData::Record(Box::new(record)));
        Self {
            source: MessageSource::Scraper,
            kind: MessageType::ScrapeProgress,
            payload,
        }
    }

    /// Count and state heartbeat
    #[must_use]
    pub fn progress_count(
        lead_kind: LeadKind,
        processed: u64,
        paused: bool,
        status: SessionStatus,
    ) -> Self {
        let mut payload = Payload::new(lead_kind.as_str());
        payload.processed = Some(processed);
        payload.paused = Some(paused);
        payload.status = Some(status);
        Self {
            source: MessageSource::Scraper,
            kind: MessageType::ScrapeProgressCount,
            payload,
        }
    }

    /// Terminal message carrying the full record set
    #[must_use]
    pub fn done(lead_kind: LeadKind, reason: DoneReason, records: Vec<LeadRecord>) -> Self {
        let mut payload = Payload::new(lead_kind.as_str());
        payload.total = Some(records.len() as u64);
        payload.processed = Some(records.len() as u64);
        payload.reason = Some(reason);
        payload.data = Some(PayloadData::Records(records));
        Self {
            source: MessageSource::Scraper,
            kind: MessageType::ScrapeDone,
            payload,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::Platform;

    #[test]
    fn command_round_trips_wire_names() {
        let raw = r#"{"source":"scraper-ui","type":"SCRAPE_PAUSE","payload":{"type":"reaction"}}"#;
        let env = Envelope::from_json(raw).expect("parse");
        assert_eq!(env.source, MessageSource::ScraperUi);
        assert_eq!(env.kind, MessageType::ScrapePause);
        assert_eq!(env.payload.lead_kind(), Some(LeadKind::Reaction));
        assert!(env.kind.is_command());
    }

    #[test]
    fn done_carries_reason_total_and_records() {
        let record = LeadRecord::new("Jane", Platform::LinkedIn, LeadKind::Comment, "https://x");
        let env = Envelope::done(LeadKind::Comment, DoneReason::Stopped, vec![record.clone()]);
        let json: serde_json::Value =
            serde_json::from_str(&env.to_json().expect("encode")).expect("json");
        assert_eq!(json["type"], "SCRAPE_DONE");
        assert_eq!(json["payload"]["reason"], "stopped");
        assert_eq!(json["payload"]["total"], 1);
        assert_eq!(json["payload"]["data"][0]["name"], "Jane");

        let back = Envelope::from_json(&env.to_json().expect("encode")).expect("decode");
        assert_eq!(back.payload.records(), vec![record]);
    }

    #[test]
    fn progress_carries_single_record() {
        let record = LeadRecord::new("Jane", Platform::LinkedIn, LeadKind::Reaction, "https://x");
        let env = Envelope::progress(LeadKind::Reaction, 3, Some(40), record);
        let json = serde_json::to_value(&env).expect("encode");
        assert_eq!(json["payload"]["index"], 3);
        assert_eq!(json["payload"]["data"]["name"], "Jane");
    }
}
