//! Long-running command loop: UI commands in, sessions out

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::errors::HarvestError;
use super::report::SessionReport;
use super::session::HarvestSession;
use crate::messaging::{CommandDispatcher, DispatchOutcome, MessageSource, MessengerError};

type SessionTask = JoinHandle<Result<SessionReport, HarvestError>>;

/// Serve UI commands for `session` until `shutdown` resolves
///
/// Start spawns a session; restart waits for the stopped session to emit its
/// `SCRAPE_DONE` and then starts a fresh one. Pause, resume and stop act on
/// the controller directly. Returns the reports of every finished session.
pub async fn serve<F>(session: Arc<HarvestSession>, shutdown: F) -> Vec<SessionReport>
where
    F: Future<Output = ()>,
{
    let mut commands = session.messenger().subscribe_from(MessageSource::ScraperUi);
    let dispatcher = CommandDispatcher::new(Arc::clone(session.controller()), session.messenger().clone());
    let mut running: Option<SessionTask> = None;
    let mut reports = Vec::new();
    tokio::pin!(shutdown);

    loop {
        let envelope = tokio::select! {
            () = &mut shutdown => break,
            message = commands.recv() => match message {
                Ok(envelope) => envelope,
                Err(MessengerError::ReceiverLagged(n)) => {
                    warn!("Command listener lagged, {n} commands lost");
                    continue;
                }
                Err(_) => break,
            },
        };

        match dispatcher.dispatch(&envelope) {
            DispatchOutcome::StartRequested(kind) | DispatchOutcome::RestartRequested(kind) => {
                if kind != session.controller().snapshot().kind {
                    warn!(requested = %kind, "This page serves a different list kind, starting it anyway");
                }
                if let Some(report) = finish(running.take()).await {
                    reports.push(report);
                }
                // Claim the controller before the task exists so a stop
                // dispatched next already sees a loading session.
                let started = match session.controller().start() {
                    Ok(started) => started,
                    Err(e) => {
                        warn!("Could not start session: {e}");
                        continue;
                    }
                };
                let task_session = Arc::clone(&session);
                running = Some(tokio::spawn(async move { Ok(task_session.run_started(started).await) }));
            }
            outcome => info!(?outcome, "Command handled"),
        }
    }

    session.controller().stop();
    if let Some(report) = finish(running.take()).await {
        reports.push(report);
    }
    reports
}

async fn finish(task: Option<SessionTask>) -> Option<SessionReport> {
    match task?.await {
        Ok(Ok(report)) => Some(report),
        Ok(Err(e)) => {
            warn!("Session ended with error: {e}");
            None
        }
        Err(e) => {
            warn!("{}", HarvestError::Task(e.to_string()));
            None
        }
    }
}
