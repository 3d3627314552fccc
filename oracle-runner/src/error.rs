//! Poll cycle errors

use oracle_client::{ClientError, InferenceError};
use thiserror::Error;

/// Ways a single poll cycle can fail
#[derive(Debug, Error)]
pub enum CycleError {
    /// The remote process does not recognize this node; retrying cannot help
    #[error("Node {node_id} is not authorized by the remote process")]
    Authorization { node_id: String },

    /// Checking for or fetching a task failed
    #[error("Remote call failed: {0}")]
    Remote(#[from] ClientError),

    /// A response had the wrong shape for the polling protocol
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Inference for a claimed task failed
    #[error("Inference failed for task {reference}: {source}")]
    Inference {
        reference: String,
        #[source]
        source: InferenceError,
    },

    /// Submitting the output of a task failed
    #[error("Submitting task {reference} failed: {source}")]
    Submit {
        reference: String,
        #[source]
        source: ClientError,
    },

    /// The remote process answered the submission with a non-200 code
    #[error("Submission of task {reference} rejected with code {code}")]
    Rejected { reference: String, code: String },
}

impl CycleError {
    /// Fatal errors stop the node instead of waiting for the next cycle
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authorization { .. })
    }

    /// Reference of the task being processed when the error occurred
    pub fn task_reference(&self) -> Option<&str> {
        match self {
            Self::Inference { reference, .. }
            | Self::Submit { reference, .. }
            | Self::Rejected { reference, .. } => Some(reference),
            _ => None,
        }
    }
}
