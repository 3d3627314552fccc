//! Error types for the oracle client

use thiserror::Error;

/// Result type alias for process client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while talking to the remote process
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// A compute or messenger unit returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// The remote process reported an error or a non-200 status
    #[error("Remote process error: {0}")]
    Remote(String),

    /// The response was missing fields or had the wrong shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The signer refused or failed to sign a commit envelope
    #[error("Signing failed: {0}")]
    Signing(String),

    /// The message was accepted but never settled
    #[error("Message {message_id} did not settle in time")]
    SettlementTimeout { message_id: String },
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error was reported by the remote process itself
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

/// Errors raised by a single inference call
#[derive(Debug, Error)]
pub enum InferenceError {
    /// No response within the configured timeout
    #[error("Inference timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// Connection, TLS or body read failure
    #[error("Inference request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend answered with an error status
    #[error("Inference backend error (status {status}): {body}")]
    Backend { status: u16, body: String },
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Transport(err)
        }
    }
}

impl InferenceError {
    /// Status code reported by the backend, if it answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            Self::Timeout(_) => None,
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }
}
