//! Scrape session ownership and cooperative control
//!
//! `ScrapeController` is the only writer of `ScrapeSession`; everyone else
//! reads snapshots or receives status messages.

pub mod controller;
pub mod types;

pub use controller::{DEFAULT_POLL_INTERVAL, ScrapeController};
pub use types::{ControllerError, DoneReason, Flow, ScrapeSession, SessionStatus};
