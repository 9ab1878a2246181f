//! Error types for the cross-context messenger

#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    /// Nobody was listening; the message is dropped, not retried
    #[error("No active subscribers")]
    NoSubscribers,

    #[error("Receiver lagged behind, missed {0} messages")]
    ReceiverLagged(u64),

    #[error("Messenger shutdown")]
    Shutdown,

    #[error("Malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Background worker unavailable")]
    WorkerGone,
}
