//! Error types for response decoding

use thiserror::Error;

/// Errors raised while pulling tags or data out of an execution result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The result carries no `Messages` field at all
    #[error("Invalid result format: no messages field")]
    InvalidFormat,

    /// The requested message does not exist
    #[error("No message at index {index} (result has {len})")]
    Index { index: usize, len: usize },
}
