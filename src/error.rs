//! Error taxonomy for the fetch pipeline and the local stores.

use thiserror::Error;

/// Everything that can go wrong while fetching one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,
    #[error("HTTP error! status: {status}")]
    Http { status: u16 },
    #[error("invalid payload: {reason}")]
    Validation { reason: String },
    #[error("network error: {0}")]
    Network(String),
}

impl FetchError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        FetchError::Validation {
            reason: reason.into(),
        }
    }

    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout => "timeout",
            FetchError::Http { .. } => "http",
            FetchError::Validation { .. } => "validation",
            FetchError::Network(_) => "network",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Http {
                status: status.as_u16(),
            }
        } else if e.is_decode() {
            FetchError::validation(format!("body is not valid JSON: {e}"))
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Read/write failure of a persisted file (settings or cache).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Rejection from the generic settings setter. State is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Invalid setting key")]
    UnknownKey(String),
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
