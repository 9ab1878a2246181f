//! Filtered receivers over the messenger channel

use std::sync::Arc;
use tokio::sync::broadcast;

use super::errors::MessengerError;
use super::types::Envelope;

/// Receiver that only yields envelopes passing `filter`
pub struct FilteredReceiver<F>
where
    F: Fn(&Envelope) -> bool + Send + Sync + 'static,
{
    receiver: broadcast::Receiver<Envelope>,
    filter: Arc<F>,
}

impl<F> FilteredReceiver<F>
where
    F: Fn(&Envelope) -> bool + Send + Sync + 'static,
{
    pub fn new(receiver: broadcast::Receiver<Envelope>, filter: F) -> Self {
        Self {
            receiver,
            filter: Arc::new(filter),
        }
    }

    /// Next matching envelope
    ///
    /// A lagged receiver reports how many messages it lost; the caller
    /// decides whether to resync with a snapshot query.
    pub async fn recv(&mut self) -> Result<Envelope, MessengerError> {
        loop {
            match self.receiver.recv().await {
                Ok(env) => {
                    if (self.filter)(&env) {
                        return Ok(env);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return Err(MessengerError::Shutdown),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    return Err(MessengerError::ReceiverLagged(skipped));
                }
            }
        }
    }

    /// Matching envelope if one is already buffered
    pub fn try_recv(&mut self) -> Result<Option<Envelope>, MessengerError> {
        loop {
            match self.receiver.try_recv() {
                Ok(env) => {
                    if (self.filter)(&env) {
                        return Ok(Some(env));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => return Err(MessengerError::Shutdown),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    return Err(MessengerError::ReceiverLagged(skipped));
                }
            }
        }
    }

    /// Drain everything currently buffered that matches
    pub fn drain(&mut self) -> Vec<Envelope> {
        let mut out = Vec::new();
        loop {
            match self.try_recv() {
                Ok(Some(env)) => out.push(env),
                Ok(None) | Err(MessengerError::Shutdown) => break,
                Err(_) => continue,
            }
        }
        out
    }
}
