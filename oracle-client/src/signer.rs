//! Signing capability for commit-mode calls
//!
//! Wallet loading and the signed data-item format belong to the operator's
//! tooling. The client only needs something that turns an envelope into
//! bytes the messenger unit will accept, so that is all [`Signer`] exposes.

use async_trait::async_trait;
use oracle_core::domain::Envelope;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Signs envelopes on behalf of the node's wallet
#[async_trait]
pub trait Signer: Send + Sync {
    /// Wallet address used as the owner of dry-run requests, if known
    fn address(&self) -> Option<&str>;

    /// Produces the signed data item for `envelope`
    async fn sign(&self, envelope: &Envelope) -> Result<Vec<u8>>;
}

/// Limit on a single run of the signing program
pub const DEFAULT_SIGNER_TIMEOUT: Duration = Duration::from_secs(30);

/// Signer backed by an external program
///
/// The program receives the envelope as JSON on stdin and must write the
/// signed data item to stdout. Non-zero exit status and empty output are
/// signing failures. A program that outlives the timeout is killed.
#[derive(Debug, Clone)]
pub struct CommandSigner {
    program: String,
    args: Vec<String>,
    address: Option<String>,
    timeout: Duration,
}

impl CommandSigner {
    /// Creates a signer from a whitespace separated command line
    ///
    /// The command line is split on whitespace only, without shell quoting.
    /// Arguments or paths that contain spaces need a wrapper script.
    ///
    /// # Arguments
    /// * `command_line` - Program followed by its arguments
    /// * `address` - Wallet address the program signs for, if known
    pub fn new(command_line: &str, address: Option<String>) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| ClientError::Signing("empty signer command".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
            address,
            timeout: DEFAULT_SIGNER_TIMEOUT,
        })
    }

    /// Sets the limit on a single signing run
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl Signer for CommandSigner {
    fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    async fn sign(&self, envelope: &Envelope) -> Result<Vec<u8>> {
        let input = serde_json::to_vec(envelope)
            .map_err(|e| ClientError::Signing(format!("Failed to encode envelope: {}", e)))?;

        debug!("Signing envelope with '{}'", self.program);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ClientError::Signing(format!("Failed to run '{}': {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&input)
                .await
                .map_err(|e| ClientError::Signing(format!("Failed to write envelope: {}", e)))?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                ClientError::Signing(format!(
                    "'{}' did not finish within {:?}",
                    self.program, self.timeout
                ))
            })?
            .map_err(|e| ClientError::Signing(format!("Signer did not finish: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClientError::Signing(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        if output.stdout.is_empty() {
            return Err(ClientError::Signing(format!(
                "'{}' produced no output",
                self.program
            )));
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_core::domain::Tag;

    fn envelope() -> Envelope {
        Envelope::new(
            "proc",
            vec![Tag::new("Action", "Task-Response")],
            &serde_json::json!({"output": "x"}),
        )
    }

    #[test]
    fn test_command_line_split() {
        let signer = CommandSigner::new("node sign.js --wallet key.json", None).unwrap();
        assert_eq!(signer.program(), "node");
        assert_eq!(signer.args, vec!["sign.js", "--wallet", "key.json"]);
        assert_eq!(signer.address(), None);
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(matches!(
            CommandSigner::new("   ", None),
            Err(ClientError::Signing(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sign_echoes_program_output() {
        let signer = CommandSigner::new("cat", Some("addr".to_string())).unwrap();
        let signed = signer.sign(&envelope()).await.unwrap();

        let echoed: Envelope = serde_json::from_slice(&signed).unwrap();
        assert_eq!(echoed, envelope());
        assert_eq!(signer.address(), Some("addr"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sign_fails_on_non_zero_exit() {
        let signer = CommandSigner::new("false", None).unwrap();
        assert!(matches!(
            signer.sign(&envelope()).await,
            Err(ClientError::Signing(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sign_fails_on_empty_output() {
        let signer = CommandSigner::new("sh -c cat>/dev/null", None).unwrap();
        match signer.sign(&envelope()).await {
            Err(ClientError::Signing(msg)) => assert!(msg.contains("no output")),
            other => panic!("expected signing error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sign_times_out_on_hung_program() {
        let signer = CommandSigner::new("sleep 5", None)
            .unwrap()
            .with_timeout(Duration::from_millis(100));

        let started = std::time::Instant::now();
        match signer.sign(&envelope()).await {
            Err(ClientError::Signing(msg)) => assert!(msg.contains("did not finish")),
            other => panic!("expected signing error, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_sign_fails_for_missing_program() {
        let signer = CommandSigner::new("definitely-not-a-signer-binary", None).unwrap();
        assert!(matches!(
            signer.sign(&envelope()).await,
            Err(ClientError::Signing(_))
        ));
    }
}
