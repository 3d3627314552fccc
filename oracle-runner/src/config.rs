//! Node configuration
//!
//! Defines all configurable parameters for the node including the remote
//! process to serve, the inference backend, and polling intervals.

use anyhow::Context;
use serde_json::Value as JsonValue;
use std::str::FromStr;
use std::time::Duration;

/// Inference configuration used when a task carries none
pub const DEFAULT_INFERENCE_CONFIG: &str = r#"{"n_predict":512,"temperature":0.7}"#;

/// Node configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Id of the remote process that owns the task queue
    pub process_id: String,

    /// Identity this node claims tasks under
    pub node_id: String,

    /// Program that signs commit-mode envelopes
    pub signer_command: String,

    /// Limit on a single run of the signing program
    pub signer_timeout: Duration,

    /// Wallet address the signer signs for, used as dry-run owner
    pub wallet_address: Option<String>,

    /// Compute unit base URL
    pub cu_url: String,

    /// Messenger unit base URL
    pub mu_url: String,

    /// Inference backend base URL (e.g., "http://localhost:8000")
    pub inference_url: String,

    /// Wait between poll cycles, after success and failure alike
    pub poll_interval: Duration,

    /// Limit on a single inference call
    pub inference_timeout: Duration,

    /// Inference configuration for tasks that carry none
    pub default_inference_config: JsonValue,

    /// How often to re-read a committed message that has not settled
    pub settle_interval: Duration,

    /// How long to wait for a committed message to settle
    pub settle_timeout: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(process_id: String, node_id: String, signer_command: String) -> Self {
        Self {
            process_id,
            node_id,
            signer_command,
            signer_timeout: Duration::from_secs(30),
            wallet_address: None,
            cu_url: "https://cu.ao-testnet.xyz".to_string(),
            mu_url: "https://mu.ao-testnet.xyz".to_string(),
            inference_url: "http://localhost:8000".to_string(),
            poll_interval: Duration::from_millis(5000),
            inference_timeout: Duration::from_secs(120),
            default_inference_config: default_inference_config(),
            settle_interval: Duration::from_millis(1000),
            settle_timeout: Duration::from_secs(60),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - ORACLE_PROCESS_ID (required)
    /// - ORACLE_NODE_ID (required)
    /// - ORACLE_SIGNER_COMMAND (required)
    /// - ORACLE_SIGNER_TIMEOUT_SECS (optional, default: 30)
    /// - ORACLE_WALLET_ADDRESS (optional)
    /// - ORACLE_CU_URL / ORACLE_MU_URL (optional, ao testnet units)
    /// - INFERENCE_URL (optional, default: http://localhost:8000)
    /// - POLL_INTERVAL_MS (optional, default: 5000)
    /// - INFERENCE_TIMEOUT_SECS (optional, default: 120)
    /// - INFERENCE_DEFAULT_CONFIG (optional, JSON)
    /// - SETTLE_INTERVAL_MS (optional, default: 1000)
    /// - SETTLE_TIMEOUT_SECS (optional, default: 60)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| anyhow::anyhow!("{} environment variable not set", key))
        };

        let mut config = Self::new(
            required("ORACLE_PROCESS_ID")?,
            required("ORACLE_NODE_ID")?,
            required("ORACLE_SIGNER_COMMAND")?,
        );

        config.wallet_address = lookup("ORACLE_WALLET_ADDRESS").filter(|a| !a.is_empty());

        if let Some(url) = lookup("ORACLE_CU_URL") {
            config.cu_url = url;
        }
        if let Some(url) = lookup("ORACLE_MU_URL") {
            config.mu_url = url;
        }
        if let Some(url) = lookup("INFERENCE_URL") {
            config.inference_url = url;
        }

        if let Some(ms) = parse_var::<u64>(&lookup, "POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "ORACLE_SIGNER_TIMEOUT_SECS")? {
            config.signer_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "INFERENCE_TIMEOUT_SECS")? {
            config.inference_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "SETTLE_INTERVAL_MS")? {
            config.settle_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "SETTLE_TIMEOUT_SECS")? {
            config.settle_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("INFERENCE_DEFAULT_CONFIG") {
            config.default_inference_config = serde_json::from_str(&raw)
                .context("INFERENCE_DEFAULT_CONFIG is not valid JSON")?;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.process_id.is_empty() {
            anyhow::bail!("process_id cannot be empty");
        }

        if self.node_id.is_empty() {
            anyhow::bail!("node_id cannot be empty");
        }

        if self.signer_command.trim().is_empty() {
            anyhow::bail!("signer_command cannot be empty");
        }

        for (name, url) in [
            ("cu_url", &self.cu_url),
            ("mu_url", &self.mu_url),
            ("inference_url", &self.inference_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if self.signer_timeout.is_zero() {
            anyhow::bail!("signer_timeout must be greater than 0");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.inference_timeout.is_zero() {
            anyhow::bail!("inference_timeout must be greater than 0");
        }

        if self.settle_interval.is_zero() {
            anyhow::bail!("settle_interval must be greater than 0");
        }

        Ok(())
    }
}

fn default_inference_config() -> JsonValue {
    serde_json::from_str(DEFAULT_INFERENCE_CONFIG).unwrap_or(JsonValue::Null)
}

/// Parses an optional variable, failing loudly on malformed values
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{} has invalid value '{}'", key, raw))
        })
        .transpose()
}
