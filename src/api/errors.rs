//! Error types for upstream HTTP fetches.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Upstream responded with {status_code}")]
    Status { status_code: u16, url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Timeout for {url}: {message}")]
    Timeout { url: String, message: String },

    #[error("Failed to read body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("Deserialization error for {url}: {message}")]
    Deserialization { url: String, message: String },
}

impl FetchError {
    /// Classify a transport-level reqwest failure.
    pub fn from_transport(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// HTTP status code, when the upstream answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Short human-readable reason used for `fallbackReason`.
    pub fn reason(&self) -> String {
        match self {
            Self::Status { status_code, .. } => format!("Upstream responded with {status_code}"),
            Self::Network { message, .. } => format!("Upstream unreachable: {message}"),
            Self::Timeout { .. } => "Upstream timed out".to_string(),
            Self::Body { message, .. } => format!("Upstream body unreadable: {message}"),
            Self::Deserialization { message, .. } => format!("Upstream payload invalid: {message}"),
        }
    }
}
