//! Oracle HTTP clients
//!
//! Clients for the two services an oracle node talks to: the remote process
//! that owns the task queue, and the inference backend that produces task
//! outputs.
//!
//! # Example
//!
//! ```no_run
//! use oracle_client::{AoProcessClient, CommandSigner, Mode, ProcessClient};
//! use oracle_core::decoder;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let signer = Arc::new(CommandSigner::new("ao-sign --wallet wallet.json", None)?);
//!     let client = AoProcessClient::new(
//!         "process-id",
//!         "https://cu.ao-testnet.xyz",
//!         "https://mu.ao-testnet.xyz",
//!         signer,
//!     );
//!
//!     let result = client
//!         .execute(Mode::Simulate, &[("Action", "Has-Pending-Task")], serde_json::Value::Null, true)
//!         .await?;
//!
//!     println!("{:?}", decoder::tags_of(&result, 0)?);
//!     Ok(())
//! }
//! ```

pub mod error;
mod inference;
mod process;
mod signer;

// Re-export commonly used types
pub use error::{ClientError, InferenceError, Result};
pub use inference::{DEFAULT_INFERENCE_TIMEOUT, HttpInferenceClient, INFERENCE_PATH, InferenceClient};
pub use process::{AoProcessClient, Mode, ProcessClient, check_result};
pub use signer::{CommandSigner, DEFAULT_SIGNER_TIMEOUT, Signer};
