//! Error types for the sync engine.

use thiserror::Error;

/// Errors raised by the remote store boundary.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error response from the remote store
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid request (bad token format, malformed URL, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl BackendError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised by local state mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The reward threshold has not been reached yet.
    #[error("reward is still locked: {0}")]
    RewardLocked(String),

    /// Claiming twice is rejected (no double-spend).
    #[error("reward was already claimed: {0}")]
    RewardAlreadyClaimed(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}
