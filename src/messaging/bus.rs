//! Broadcast bridge between the scraper and UI contexts
//!
//! Delivery is at-most-once per hop: a message published while nobody is
//! listening is counted as dropped and never replayed. Order per sender is
//! preserved by the underlying broadcast channel.

use tokio::sync::broadcast;

use super::errors::MessengerError;
use super::metrics::MessengerMetrics;
use super::streaming::FilteredReceiver;
use super::types::{Envelope, MessageSource};

/// Default buffered messages per subscriber
pub const DEFAULT_CAPACITY: usize = 1024;

/// Cloneable handle to one shared message channel
#[derive(Debug, Clone)]
pub struct Messenger {
    sender: broadcast::Sender<Envelope>,
    metrics: MessengerMetrics,
}

impl Messenger {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            metrics: MessengerMetrics::new(),
        }
    }

    #[must_use]
    pub fn metrics(&self) -> &MessengerMetrics {
        &self.metrics
    }

    /// Publish to every current subscriber
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of subscribers that will see the message
    /// * `Err(MessengerError::NoSubscribers)` - Dropped; nobody was listening
    pub fn publish(&self, envelope: Envelope) -> Result<usize, MessengerError> {
        match self.sender.send(envelope) {
            Ok(count) => {
                self.metrics.increment_published();
                self.metrics.update_subscriber_count(count);
                Ok(count)
            }
            Err(broadcast::error::SendError(dropped)) => {
                self.metrics.increment_dropped();
                log::debug!("Dropped {:?} with no active subscribers", dropped.kind);
                Err(MessengerError::NoSubscribers)
            }
        }
    }

    /// Publish and ignore the no-listener case
    pub fn emit(&self, envelope: Envelope) {
        let _ = self.publish(envelope);
    }

    /// Raw subscription to every message on the bridge
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }

    /// Messages sent by `source` only
    #[must_use]
    pub fn subscribe_from(
        &self,
        source: MessageSource,
    ) -> FilteredReceiver<impl Fn(&Envelope) -> bool + Send + Sync + 'static> {
        FilteredReceiver::new(self.sender.subscribe(), move |env: &Envelope| {
            env.source == source
        })
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Messenger {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
