//! Oracle Node
//!
//! A single-worker bridge between a task queue hosted on a remote process
//! and an inference backend.
//!
//! Architecture:
//! - Configuration: Load settings from the environment
//! - Clients: process client (dry runs, signed messages) and inference client
//! - Scheduler: the check -> fetch -> infer -> submit polling loop
//!
//! The node runs until it is stopped externally, or until the remote process
//! refuses its identity, in which case it exits with a non-zero status.

mod config;
mod error;
mod scheduler;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::scheduler::TaskPoller;
use oracle_client::{AoProcessClient, CommandSigner, HttpInferenceClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oracle_runner=info,oracle_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting oracle node");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;
    info!(
        "Loaded configuration: node_id={}, process_id={}, inference_url={}",
        config.node_id, config.process_id, config.inference_url
    );

    let signer = CommandSigner::new(&config.signer_command, config.wallet_address.clone())
        .context("Failed to set up signer")?
        .with_timeout(config.signer_timeout);
    info!("Commit messages signed by '{}'", signer.program());

    let process = AoProcessClient::new(
        config.process_id.clone(),
        config.cu_url.clone(),
        config.mu_url.clone(),
        Arc::new(signer),
    )
    .with_settlement(config.settle_interval, config.settle_timeout);

    let inference = HttpInferenceClient::new(config.inference_url.clone(), config.inference_timeout)
        .context("Failed to build inference client")?;

    info!(
        "Clients initialized (cu: {}, mu: {}, inference timeout: {:?})",
        config.cu_url, config.mu_url, config.inference_timeout
    );

    let mut poller = TaskPoller::new(&config, Arc::new(process), Arc::new(inference));

    if let Err(e) = poller.run().await {
        error!("Poller error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
