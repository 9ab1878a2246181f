//! Single dispatch table from UI commands to controller actions

use std::sync::Arc;

use tracing::debug;

use super::bus::Messenger;
use super::types::{Envelope, MessageSource, MessageType};
use crate::leads::LeadKind;
use crate::session::ScrapeController;

/// What a command did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not a UI command, or a command that does not apply in this state
    Ignored,
    Paused,
    Resumed,
    Stopped,
    /// The caller should start a session of this kind
    StartRequested(LeadKind),
    /// The current session was stopped; the caller should start a fresh one
    RestartRequested(LeadKind),
    /// Start while a session is active; the current count was re-sent
    AlreadyRunning,
}

pub struct CommandDispatcher {
    controller: Arc<ScrapeController>,
    messenger: Messenger,
}

impl CommandDispatcher {
    #[must_use]
    pub fn new(controller: Arc<ScrapeController>, messenger: Messenger) -> Self {
        Self {
            controller,
            messenger,
        }
    }

    pub fn dispatch(&self, envelope: &Envelope) -> DispatchOutcome {
        if envelope.source != MessageSource::ScraperUi || !envelope.kind.is_command() {
            return DispatchOutcome::Ignored;
        }
        let session = self.controller.snapshot();
        let kind = envelope.payload.lead_kind().unwrap_or(session.kind);

        let outcome = match envelope.kind {
            MessageType::ScrapePause if self.controller.pause() => DispatchOutcome::Paused,
            MessageType::ScrapeResume if self.controller.resume() => DispatchOutcome::Resumed,
            MessageType::ScrapeStop if self.controller.stop() => DispatchOutcome::Stopped,
            MessageType::ScrapeStart if session.status.is_active() => {
                self.messenger.emit(Envelope::progress_count(
                    session.kind,
                    session.processed_count,
                    self.controller.is_paused(),
                    session.status,
                ));
                DispatchOutcome::AlreadyRunning
            }
            MessageType::ScrapeStart => DispatchOutcome::StartRequested(kind),
            MessageType::ScrapeRestart => {
                self.controller.stop();
                DispatchOutcome::RestartRequested(kind)
            }
            _ => DispatchOutcome::Ignored,
        };
        debug!(command = ?envelope.kind, ?outcome, "Dispatched UI command");
        outcome
    }
}
