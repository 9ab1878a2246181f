use thiserror::Error;

/// Backend call failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// Connection refused, reset, timed out
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP {code} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        code: u16,
        body: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid backend configuration: {0}")]
    Config(String),
}

impl IngestError {
    /// Transport failures, 5xx and 429 are worth another attempt
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { code, .. } => *code >= 500 || *code == 429,
            Self::Decode(_) | Self::Config(_) => false,
        }
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else if e.is_builder() {
            Self::Config(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> IngestError {
        IngestError::Status {
            endpoint: "/scraping/ingest".into(),
            code,
            body: String::new(),
        }
    }

    #[test]
    fn classifies_retryable_statuses() {
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(IngestError::Transport("reset".into()).is_retryable());
        assert!(!IngestError::Decode("eof".into()).is_retryable());
    }
}
