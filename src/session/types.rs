use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::leads::{LeadKind, Platform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Loading,
    Running,
    Paused,
    Stopped,
    Completed,
}

impl SessionStatus {
    /// Loading, running or paused
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Loading | Self::Running | Self::Paused)
    }

    /// A new session may begin from here
    #[must_use]
    pub fn can_start(self) -> bool {
        matches!(self, Self::Idle | Self::Stopped | Self::Completed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Why a session ended; always present on `SCRAPE_DONE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoneReason {
    Completed,
    Stopped,
    /// Server quota (or local cap) was already used up before the pass
    LimitReached,
}

/// Outcome of a cooperative checkpoint
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

impl Flow {
    #[must_use]
    pub fn is_stop(self) -> bool {
        self == Self::Stop
    }
}

/// Snapshot of the controller-owned session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeSession {
    pub id: Uuid,
    pub platform: Platform,
    #[serde(rename = "type")]
    pub kind: LeadKind,
    pub status: SessionStatus,
    pub processed_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl ScrapeSession {
    #[must_use]
    pub fn idle(platform: Platform, kind: LeadKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            platform,
            kind,
            status: SessionStatus::Idle,
            processed_count: 0,
            expected_total: None,
            started_at: None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("A session is already {0}")]
    AlreadyActive(SessionStatus),

    #[error("Cannot move from {from} to {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },
}
