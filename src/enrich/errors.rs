use thiserror::Error;

/// Failures while driving the hidden profile frame
#[derive(Error, Debug, Clone)]
pub enum EnrichError {
    #[error("Failed to load {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Profile frame error: {0}")]
    Frame(String),

    #[error("Profile frame timed out: {0}")]
    Timeout(String),
}
