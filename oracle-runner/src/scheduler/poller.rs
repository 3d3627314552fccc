//! Task poller
//!
//! Drives the node's single worker loop:
//! check (dry run) -> fetch (commit) -> infer -> submit (commit) -> sleep.
//!
//! Exactly one task is in flight at a time. Any failure is logged and the
//! loop waits the same fixed interval it waits after a successful cycle;
//! recovering a task that failed locally is left to the remote process,
//! which reassigns it. Only an authorization failure stops the loop.

use oracle_client::{InferenceClient, Mode, ProcessClient};
use oracle_core::decoder::{self, Payload};
use oracle_core::domain::{ExecutionResult, Task, TaskCode};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::CycleError;

const ACTION_HAS_PENDING_TASK: &str = "Has-Pending-Task";
const ACTION_GET_PENDING_TASK: &str = "Get-Pending-Task";
const ACTION_TASK_RESPONSE: &str = "Task-Response";

/// What a single poll cycle ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The check reported nothing pending
    NoWork,
    /// The check saw work but the fetch found none; another node claimed it
    Raced,
    /// The fetch answered with a code the protocol does not define
    Unexpected { code: String },
    /// A task was processed and its output accepted
    Completed { reference: String },
}

/// Result of a fetch round trip
enum Fetched {
    Task(Task),
    Raced,
    Unexpected(String),
}

/// Polls the remote process for tasks and processes them one at a time
pub struct TaskPoller {
    node_id: String,
    poll_interval: Duration,
    default_inference_config: JsonValue,
    process: Arc<dyn ProcessClient>,
    inference: Arc<dyn InferenceClient>,
    last_submitted: Option<String>,
}

impl TaskPoller {
    /// Creates a new task poller
    pub fn new(
        config: &Config,
        process: Arc<dyn ProcessClient>,
        inference: Arc<dyn InferenceClient>,
    ) -> Self {
        Self {
            node_id: config.node_id.clone(),
            poll_interval: config.poll_interval,
            default_inference_config: config.default_inference_config.clone(),
            process,
            inference,
            last_submitted: None,
        }
    }

    /// Starts the polling loop
    ///
    /// Only returns on a fatal error.
    pub async fn run(&mut self) -> Result<(), CycleError> {
        info!(
            "Starting task poller for node {} (interval: {:?})",
            self.node_id, self.poll_interval
        );

        loop {
            self.tick().await?;
        }
    }

    /// Runs one cycle, logs its outcome, then waits one poll interval
    pub async fn tick(&mut self) -> Result<(), CycleError> {
        match self.run_once().await {
            Ok(CycleOutcome::Completed { reference }) => {
                info!("Task {} completed", reference);
            }
            Ok(outcome) => {
                debug!("Poll cycle finished: {:?}", outcome);
            }
            Err(e) if e.is_fatal() => {
                error!("Stopping task poller: {}", e);
                return Err(e);
            }
            Err(e) => match e.task_reference() {
                Some(reference) => error!("Poll cycle failed (task {}): {}", reference, e),
                None => error!("Poll cycle failed: {}", e),
            },
        }

        tokio::time::sleep(self.poll_interval).await;
        Ok(())
    }

    /// Performs a single poll cycle without waiting afterwards
    pub async fn run_once(&mut self) -> Result<CycleOutcome, CycleError> {
        debug!("Checking for pending tasks");

        if !self.has_pending_task().await? {
            debug!("No pending tasks");
            return Ok(CycleOutcome::NoWork);
        }

        let task = match self.fetch_task().await? {
            Fetched::Task(task) => task,
            Fetched::Raced => {
                debug!("Pending task was claimed before fetch");
                return Ok(CycleOutcome::Raced);
            }
            Fetched::Unexpected(code) => {
                warn!("Unexpected code {} while fetching task", code);
                return Ok(CycleOutcome::Unexpected { code });
            }
        };

        info!("Claimed task {}", task.reference);

        if self.last_submitted.as_deref() == Some(task.reference.as_str()) {
            warn!(
                "Task {} was re-issued after its output was submitted",
                task.reference
            );
        }

        let config = task
            .config
            .as_ref()
            .unwrap_or(&self.default_inference_config);

        let output = self
            .inference
            .infer(&task.prompt, Some(config))
            .await
            .map_err(|source| CycleError::Inference {
                reference: task.reference.clone(),
                source,
            })?;

        debug!("Inference for task {} produced {} bytes", task.reference, output.len());

        self.submit(&task.reference, output).await?;
        self.last_submitted = Some(task.reference.clone());

        Ok(CycleOutcome::Completed {
            reference: task.reference,
        })
    }

    /// Reference of the last task whose output was accepted
    #[allow(dead_code)]
    pub fn last_submitted(&self) -> Option<&str> {
        self.last_submitted.as_deref()
    }

    // =============================================================================
    // Protocol steps
    // =============================================================================

    /// Dry-run check for pending work; anything but 204 means work exists
    async fn has_pending_task(&self) -> Result<bool, CycleError> {
        let result = self
            .process
            .execute(
                Mode::Simulate,
                &[("Action", ACTION_HAS_PENDING_TASK)],
                JsonValue::Null,
                true,
            )
            .await?;

        Ok(response_code(&result)? != Some(TaskCode::NoContent))
    }

    /// Claims the next pending task for this node
    async fn fetch_task(&self) -> Result<Fetched, CycleError> {
        let result = self
            .process
            .execute(
                Mode::Commit,
                &[
                    ("Action", ACTION_GET_PENDING_TASK),
                    ("NodeID", self.node_id.as_str()),
                    ("Nodeid", self.node_id.as_str()),
                ],
                JsonValue::Null,
                true,
            )
            .await?;

        match response_code(&result)? {
            Some(TaskCode::Ok) => parse_task(&result).map(Fetched::Task),
            Some(TaskCode::NoContent) => Ok(Fetched::Raced),
            Some(TaskCode::Forbidden) => Err(CycleError::Authorization {
                node_id: self.node_id.clone(),
            }),
            Some(TaskCode::Unexpected(code)) => Ok(Fetched::Unexpected(code)),
            None => Err(CycleError::Protocol(
                "fetch response carries no Code tag".to_string(),
            )),
        }
    }

    /// Sends a task's output back to the remote process
    async fn submit(&self, reference: &str, output: String) -> Result<(), CycleError> {
        let result = self
            .process
            .execute(
                Mode::Commit,
                &[
                    ("Action", ACTION_TASK_RESPONSE),
                    ("X-Oracle-Node-Id", self.node_id.as_str()),
                    ("X-Reference", reference),
                ],
                json!({ "output": output }),
                true,
            )
            .await
            .map_err(|source| CycleError::Submit {
                reference: reference.to_string(),
                source,
            })?;

        // Acknowledgements without a Code tag are accepted as-is
        match decoder::tags_of(&result, 0).ok().and_then(|t| TaskCode::from_tags(&t)) {
            None | Some(TaskCode::Ok) => Ok(()),
            Some(code) => Err(CycleError::Rejected {
                reference: reference.to_string(),
                code: code.to_string(),
            }),
        }
    }
}

/// Reads the `Code` tag of the first message
fn response_code(result: &ExecutionResult) -> Result<Option<TaskCode>, CycleError> {
    let tags = decoder::tags_of(result, 0)
        .map_err(|e| CycleError::Protocol(format!("unreadable response: {}", e)))?;
    Ok(TaskCode::from_tags(&tags))
}

/// Decodes the task carried by a successful fetch
fn parse_task(result: &ExecutionResult) -> Result<Task, CycleError> {
    let payload = decoder::data_of(result, 0)
        .map_err(|e| CycleError::Protocol(format!("unreadable task payload: {}", e)))?;

    match payload {
        Payload::Json(json) => serde_json::from_value(json)
            .map_err(|e| CycleError::Protocol(format!("invalid task payload: {}", e))),
        Payload::Raw(raw) => Err(CycleError::Protocol(format!(
            "task payload is not JSON: {}",
            raw
        ))),
    }
}
