//! Process client
//!
//! One round trip against the remote process, either as a read-only dry run
//! ([`Mode::Simulate`]) or as a signed message that is waited on until it
//! settles ([`Mode::Commit`]). No retries happen here; the caller owns the
//! retry policy.

use async_trait::async_trait;
use oracle_core::codec;
use oracle_core::decoder;
use oracle_core::domain::{Envelope, ExecutionResult, RemoteStatus, Tag};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ClientError, Result};
use crate::signer::Signer;

/// How a call reaches the remote process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Read-only evaluation: unsigned, no state change
    Simulate,
    /// Signed, state-mutating message; returns once settled
    Commit,
}

/// Round trips against a single remote process
#[async_trait]
pub trait ProcessClient: Send + Sync {
    /// Sends `tags` and `payload` to the process and returns its result
    ///
    /// # Arguments
    /// * `mode` - Dry run or committed message
    /// * `tags` - Tag parameters, encoded in order
    /// * `payload` - Message data; null sends no data
    /// * `check_status` - Fail when the first message carries a `Status` other than 200
    ///
    /// # Errors
    /// A reported `Error` always fails the call with [`ClientError::Remote`],
    /// regardless of `check_status`.
    async fn execute(
        &self,
        mode: Mode,
        tags: &[(&str, &str)],
        payload: JsonValue,
        check_status: bool,
    ) -> Result<ExecutionResult>;
}

/// Applies the uniform failure rules to a raw result
///
/// A non-empty `error` wins over everything else. When `check_status` is
/// set, a `Status` tag on the first message other than `"200"` fails with
/// the status and the decoded payload. Results without messages, or whose
/// first message has no `Status` tag, pass.
pub fn check_result(result: ExecutionResult, check_status: bool) -> Result<ExecutionResult> {
    if let Some(error) = result.error_message() {
        return Err(ClientError::Remote(error.to_string()));
    }

    if check_status {
        if let Ok(tags) = decoder::tags_of(&result, 0) {
            if let Some(RemoteStatus::Other(status)) = RemoteStatus::from_tags(&tags) {
                let detail = decoder::data_of(&result, 0)
                    .map(|payload| payload.to_text())
                    .unwrap_or_default();
                return Err(ClientError::Remote(format!("status {}: {}", status, detail)));
            }
        }
    }

    Ok(result)
}

/// Process client speaking to a compute unit (dry runs, results) and a
/// messenger unit (signed messages)
#[derive(Clone)]
pub struct AoProcessClient {
    process_id: String,
    cu_url: String,
    mu_url: String,
    client: Client,
    signer: Arc<dyn Signer>,
    settle_interval: Duration,
    settle_timeout: Duration,
}

impl AoProcessClient {
    /// Create a new process client
    ///
    /// # Arguments
    /// * `process_id` - Id of the remote process every call targets
    /// * `cu_url` - Compute unit base URL
    /// * `mu_url` - Messenger unit base URL
    /// * `signer` - Signs commit-mode envelopes
    pub fn new(
        process_id: impl Into<String>,
        cu_url: impl Into<String>,
        mu_url: impl Into<String>,
        signer: Arc<dyn Signer>,
    ) -> Self {
        Self::with_client(process_id, cu_url, mu_url, signer, Client::new())
    }

    /// Create a new process client with a custom HTTP client
    pub fn with_client(
        process_id: impl Into<String>,
        cu_url: impl Into<String>,
        mu_url: impl Into<String>,
        signer: Arc<dyn Signer>,
        client: Client,
    ) -> Self {
        Self {
            process_id: process_id.into(),
            cu_url: cu_url.into().trim_end_matches('/').to_string(),
            mu_url: mu_url.into().trim_end_matches('/').to_string(),
            client,
            signer,
            settle_interval: Duration::from_secs(1),
            settle_timeout: Duration::from_secs(60),
        }
    }

    /// Sets how often and how long to wait for a committed message to settle
    pub fn with_settlement(mut self, interval: Duration, timeout: Duration) -> Self {
        self.settle_interval = interval;
        self.settle_timeout = timeout;
        self
    }

    /// Get the id of the target process
    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    // =============================================================================
    // Transport
    // =============================================================================

    /// Evaluates the envelope on the compute unit without persisting it
    async fn dry_run(&self, envelope: &Envelope) -> Result<ExecutionResult> {
        let url = format!("{}/dry-run", self.cu_url);
        let request = DryRunRequest {
            id: Uuid::new_v4().to_string(),
            target: &envelope.target,
            owner: self.signer.address(),
            anchor: "0",
            data: envelope.data.as_deref(),
            tags: &envelope.tags,
        };

        debug!("Dry run against process {}", self.process_id);

        let response = self
            .client
            .post(&url)
            .query(&[("process-id", &self.process_id)])
            .json(&request)
            .send()
            .await?;

        handle_response(response).await
    }

    /// Signs and sends the envelope, then waits for its result
    async fn commit(&self, envelope: &Envelope) -> Result<ExecutionResult> {
        let signed = self.signer.sign(envelope).await?;
        let message_id = self.send_message(signed).await?;

        debug!(
            "Message {} sent to process {}, awaiting settlement",
            message_id, self.process_id
        );

        self.await_result(&message_id).await
    }

    /// Posts a signed data item to the messenger unit and returns its id
    async fn send_message(&self, signed: Vec<u8>) -> Result<String> {
        let url = format!("{}/", self.mu_url);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .header(reqwest::header::ACCEPT, "application/json")
            .body(signed)
            .send()
            .await?;

        let receipt: MessageReceipt = handle_response(response).await?;
        if receipt.id.is_empty() {
            return Err(ClientError::Protocol(
                "messenger unit returned an empty message id".to_string(),
            ));
        }

        Ok(receipt.id)
    }

    /// Reads the result of `message_id`, waiting while it is not yet evaluated
    async fn await_result(&self, message_id: &str) -> Result<ExecutionResult> {
        let url = format!("{}/result/{}", self.cu_url, message_id);
        let deadline = Instant::now() + self.settle_timeout;

        loop {
            let response = self
                .client
                .get(&url)
                .query(&[("process-id", &self.process_id)])
                .send()
                .await?;

            if response.status() != StatusCode::NOT_FOUND {
                return handle_response(response).await;
            }

            if Instant::now() >= deadline {
                return Err(ClientError::SettlementTimeout {
                    message_id: message_id.to_string(),
                });
            }

            debug!("Message {} not settled yet", message_id);
            tokio::time::sleep(self.settle_interval).await;
        }
    }
}

#[async_trait]
impl ProcessClient for AoProcessClient {
    async fn execute(
        &self,
        mode: Mode,
        tags: &[(&str, &str)],
        payload: JsonValue,
        check_status: bool,
    ) -> Result<ExecutionResult> {
        let envelope = Envelope::new(
            self.process_id.clone(),
            codec::encode(tags.iter().copied()),
            &payload,
        );

        let result = match mode {
            Mode::Simulate => self.dry_run(&envelope).await?,
            Mode::Commit => self.commit(&envelope).await?,
        };

        check_result(result, check_status)
    }
}

// =============================================================================
// Response Handlers
// =============================================================================

/// Checks the HTTP status and deserializes the JSON body
async fn handle_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::Protocol(format!("Failed to parse JSON response: {}", e)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DryRunRequest<'a> {
    id: String,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<&'a str>,
    anchor: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a str>,
    tags: &'a [Tag],
}

#[derive(Debug, Deserialize)]
struct MessageReceipt {
    #[serde(default)]
    id: String,
}
