//! Single-session state machine shared by every step of an extraction
//!
//! `idle → loading → running ⇄ paused → stopped | completed`
//!
//! Pause and stop are cooperative: extraction steps call
//! [`ScrapeController::wait_if_paused`] between items and bail out on
//! [`Flow::Stop`]. Waiters are woken through a `Notify`, with a poll
//! interval as a fallback so a missed wakeup only costs one interval.

use chrono::Utc;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{ControllerError, Flow, ScrapeSession, SessionStatus};
use crate::leads::{LeadKind, Platform};
use crate::messaging::{Envelope, Messenger};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub struct ScrapeController {
    session: Mutex<ScrapeSession>,
    changed: Notify,
    messenger: Option<Messenger>,
    poll_interval: Duration,
}

impl ScrapeController {
    #[must_use]
    pub fn new(platform: Platform, kind: LeadKind) -> Self {
        Self {
            session: Mutex::new(ScrapeSession::idle(platform, kind)),
            changed: Notify::new(),
            messenger: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Emit a status message on every transition
    #[must_use]
    pub fn with_messenger(mut self, messenger: Messenger) -> Self {
        self.messenger = Some(messenger);
        self
    }

    /// Poll interval for `wait_if_paused`; each poll emits a paused heartbeat
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    #[must_use]
    pub fn snapshot(&self) -> ScrapeSession {
        self.session.lock().clone()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.session.lock().status
    }

    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session.lock().id
    }

    #[must_use]
    pub fn processed(&self) -> u64 {
        self.session.lock().processed_count
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.status() == SessionStatus::Stopped
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.status() == SessionStatus::Paused
    }

    /// Begin a fresh session: idle/stopped/completed → loading
    ///
    /// Resets the counters and the pause flag and assigns a new session id.
    pub fn start(&self) -> Result<ScrapeSession, ControllerError> {
        let snapshot = {
            let mut session = self.session.lock();
            if !session.status.can_start() {
                return Err(ControllerError::AlreadyActive(session.status));
            }
            session.id = Uuid::new_v4();
            session.status = SessionStatus::Loading;
            session.processed_count = 0;
            session.expected_total = None;
            session.started_at = Some(Utc::now());
            session.clone()
        };
        info!(session = %snapshot.id, kind = %snapshot.kind, "Scrape session loading");
        self.after_transition(&snapshot);
        Ok(snapshot)
    }

    /// Loading → running
    pub fn begin_running(&self) -> Result<(), ControllerError> {
        self.transition(&[SessionStatus::Loading], SessionStatus::Running)
            .map(|_| ())
    }

    /// Running → paused; `false` if not running
    pub fn pause(&self) -> bool {
        self.transition(&[SessionStatus::Running], SessionStatus::Paused)
            .is_ok()
    }

    /// Paused → running; `false` if not paused
    pub fn resume(&self) -> bool {
        self.transition(&[SessionStatus::Paused], SessionStatus::Running)
            .is_ok()
    }

    /// Loading/running/paused → stopped; `false` if nothing was active
    pub fn stop(&self) -> bool {
        self.transition(
            &[
                SessionStatus::Loading,
                SessionStatus::Running,
                SessionStatus::Paused,
            ],
            SessionStatus::Stopped,
        )
        .is_ok()
    }

    /// Loading/running/paused → completed; a stopped session stays stopped
    pub fn complete(&self) -> bool {
        self.transition(
            &[
                SessionStatus::Loading,
                SessionStatus::Running,
                SessionStatus::Paused,
            ],
            SessionStatus::Completed,
        )
        .is_ok()
    }

    /// Drop the session back to idle, from any state
    pub fn reset(&self) {
        let snapshot = {
            let mut session = self.session.lock();
            let (platform, kind) = (session.platform, session.kind);
            *session = ScrapeSession::idle(platform, kind);
            session.clone()
        };
        debug!("Scrape controller reset");
        self.after_transition(&snapshot);
    }

    /// Stop whatever is active, reset, and start again
    pub fn restart(&self) -> Result<ScrapeSession, ControllerError> {
        self.stop();
        self.reset();
        self.start()
    }

    /// Count one processed record; returns the new total
    pub fn record_processed(&self) -> u64 {
        let mut session = self.session.lock();
        session.processed_count += 1;
        session.processed_count
    }

    pub fn set_expected_total(&self, total: Option<u64>) {
        self.session.lock().expected_total = total;
    }

    /// Suspend while paused; `Flow::Stop` once stopped
    ///
    /// Emits a paused `SCRAPE_PROGRESS_COUNT` heartbeat on each poll.
    pub async fn wait_if_paused(&self) -> Flow {
        loop {
            let snapshot = self.snapshot();
            match snapshot.status {
                SessionStatus::Stopped => return Flow::Stop,
                SessionStatus::Paused => {
                    self.emit_count(&snapshot);
                    let _ = tokio::time::timeout(self.poll_interval, self.changed.notified()).await;
                }
                _ => return Flow::Continue,
            }
        }
    }

    /// Sleep for `duration`, waking early with `Flow::Stop` if stopped
    pub async fn sleep_unless_stopped(&self, duration: Duration) -> Flow {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_stopped() {
                return Flow::Stop;
            }
            let now = Instant::now();
            if now >= deadline {
                return Flow::Continue;
            }
            let step = (deadline - now).min(self.poll_interval);
            let _ = tokio::time::timeout(step, self.changed.notified()).await;
        }
    }

    fn transition(
        &self,
        from: &[SessionStatus],
        to: SessionStatus,
    ) -> Result<ScrapeSession, ControllerError> {
        let snapshot = {
            let mut session = self.session.lock();
            if !from.contains(&session.status) {
                return Err(ControllerError::InvalidTransition {
                    from: session.status,
                    to,
                });
            }
            session.status = to;
            session.clone()
        };
        info!(session = %snapshot.id, status = %to, processed = snapshot.processed_count, "Scrape session transition");
        self.after_transition(&snapshot);
        Ok(snapshot)
    }

    fn after_transition(&self, snapshot: &ScrapeSession) {
        self.changed.notify_waiters();
        self.emit_count(snapshot);
    }

    fn emit_count(&self, snapshot: &ScrapeSession) {
        if let Some(messenger) = &self.messenger {
            messenger.emit(Envelope::progress_count(
                snapshot.kind,
                snapshot.processed_count,
                snapshot.status == SessionStatus::Paused,
                snapshot.status,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{MessageSource, MessageType};
    use std::sync::Arc;

    fn controller() -> ScrapeController {
        ScrapeController::new(Platform::LinkedIn, LeadKind::Reaction)
            .with_poll_interval(Duration::from_millis(5))
    }

    #[test]
    fn walks_the_happy_path() {
        let c = controller();
        assert_eq!(c.status(), SessionStatus::Idle);
        let first = c.start().expect("start");
        assert_eq!(first.status, SessionStatus::Loading);
        c.begin_running().expect("running");
        assert!(c.pause());
        assert!(!c.pause());
        assert!(c.resume());
        c.record_processed();
        assert!(c.complete());
        assert_eq!(c.processed(), 1);

        let second = c.start().expect("restart from completed");
        assert_ne!(first.id, second.id);
        assert_eq!(second.processed_count, 0);
    }

    #[test]
    fn rejects_double_start() {
        let c = controller();
        c.start().expect("start");
        assert_eq!(
            c.start(),
            Err(ControllerError::AlreadyActive(SessionStatus::Loading))
        );
    }

    #[test]
    fn stopped_session_does_not_complete() {
        let c = controller();
        c.start().expect("start");
        c.begin_running().expect("running");
        assert!(c.stop());
        assert!(!c.complete());
        assert_eq!(c.status(), SessionStatus::Stopped);
    }

    #[tokio::test]
    async fn wait_if_paused_releases_on_resume_and_stop() {
        let c = Arc::new(controller());
        c.start().expect("start");
        c.begin_running().expect("running");
        assert_eq!(c.wait_if_paused().await, Flow::Continue);

        c.pause();
        let waiter = {
            let c = Arc::clone(&c);
            tokio::spawn(async move { c.wait_if_paused().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        c.resume();
        assert_eq!(waiter.await.expect("join"), Flow::Continue);

        c.pause();
        let waiter = {
            let c = Arc::clone(&c);
            tokio::spawn(async move { c.wait_if_paused().await })
        };
        c.stop();
        assert_eq!(waiter.await.expect("join"), Flow::Stop);
    }

    #[tokio::test]
    async fn stop_interrupts_long_sleep() {
        let c = Arc::new(controller());
        c.start().expect("start");
        let sleeper = {
            let c = Arc::clone(&c);
            tokio::spawn(async move { c.sleep_unless_stopped(Duration::from_secs(60)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        c.stop();
        let flow = tokio::time::timeout(Duration::from_secs(1), sleeper)
            .await
            .expect("woke promptly")
            .expect("join");
        assert_eq!(flow, Flow::Stop);
    }

    #[tokio::test]
    async fn transitions_emit_status_messages() {
        let messenger = Messenger::default();
        let mut rx = messenger.subscribe_from(MessageSource::Scraper);
        let c = controller().with_messenger(messenger);
        c.start().expect("start");
        c.begin_running().expect("running");
        c.pause();

        let statuses: Vec<_> = rx
            .drain()
            .into_iter()
            .filter(|e| e.kind == MessageType::ScrapeProgressCount)
            .filter_map(|e| e.payload.status)
            .collect();
        assert_eq!(
            statuses,
            vec![
                SessionStatus::Loading,
                SessionStatus::Running,
                SessionStatus::Paused
            ]
        );
    }
}
