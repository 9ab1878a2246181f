//! Observability counters for one extraction session

use serde::{Deserialize, Serialize};

use crate::utils::{MAX_DIAGNOSTIC_SAMPLES, safe_truncate_chars};

/// Why a candidate item was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// Name shorter than two characters with no other identity
    ShortName,
    /// Voice note or other media row rendered in a member list
    Audio,
    /// No phone, profile link or name that survives normalization
    InvalidIdentity,
    /// Anonymized entry such as "LinkedIn member" or an upsell card
    Placeholder,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipCounts {
    pub short_name: u64,
    pub audio: u64,
    pub invalid_identity: u64,
    pub placeholder: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSample {
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
    pub text: String,
}

/// Counters for a session; never used for control flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeDiagnostics {
    pub scanned: u64,
    pub extracted: u64,
    pub duplicates: u64,
    pub skipped: SkipCounts,
    pub samples: Vec<DiagnosticSample>,
}

impl ScrapeDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_scanned(&mut self) {
        self.scanned += 1;
    }

    pub fn record_extracted(&mut self, label: &str) {
        self.extracted += 1;
        self.push_sample("extracted", None, label);
    }

    pub fn record_duplicate(&mut self) {
        self.duplicates += 1;
    }

    pub fn record_skip(&mut self, reason: SkipReason, label: &str) {
        match reason {
            SkipReason::ShortName => self.skipped.short_name += 1,
            SkipReason::Audio => self.skipped.audio += 1,
            SkipReason::InvalidIdentity => self.skipped.invalid_identity += 1,
            SkipReason::Placeholder => self.skipped.placeholder += 1,
        }
        self.push_sample("skipped", Some(reason), label);
    }

    #[must_use]
    pub fn total_skipped(&self) -> u64 {
        let s = &self.skipped;
        s.short_name + s.audio + s.invalid_identity + s.placeholder
    }

    fn push_sample(&mut self, outcome: &str, reason: Option<SkipReason>, label: &str) {
        if self.samples.len() >= MAX_DIAGNOSTIC_SAMPLES {
            return;
        }
        self.samples.push(DiagnosticSample {
            outcome: outcome.to_string(),
            reason,
            text: safe_truncate_chars(label, 120).to_string(),
        });
    }
}
