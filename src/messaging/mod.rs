//! Cross-context messaging
//!
//! The scraper and the UI never share state directly. They exchange typed
//! [`Envelope`]s over a [`Messenger`]; a [`CommandDispatcher`] maps UI
//! commands onto the controller, and a [`BackgroundWorker`] keeps a
//! snapshot store the UI can query after missing messages.

pub mod background;
pub mod bus;
pub mod dispatch;
pub mod errors;
pub mod metrics;
pub mod stdio;
pub mod streaming;
pub mod types;

pub use background::{BackgroundHandle, BackgroundWorker, UploadSummary};
pub use bus::{DEFAULT_CAPACITY, Messenger};
pub use dispatch::{CommandDispatcher, DispatchOutcome};
pub use errors::MessengerError;
pub use metrics::{MessengerMetrics, MetricsSnapshot};
pub use stdio::{forward_from_reader, forward_to_writer};
pub use streaming::FilteredReceiver;
pub use types::{Envelope, MessageSource, MessageType, Payload, PayloadData};
