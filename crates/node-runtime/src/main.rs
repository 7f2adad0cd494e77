//! # Transport Node
//!
//! Serves device token validation requests from the transport API request
//! topic until Ctrl+C.
//!
//! ## Environment
//!
//! - `DA_CONFIG`: TOML config file (default `config/transport.toml`)
//! - `DA_SEED_FILE`: optional JSON registry seed
//! - `DA_PARTITIONS`: broker partition count (default 1)
//! - `RUST_LOG`: log filter (default `info`)

use anyhow::{Context, Result};
use node_runtime::config::{config_path, NodeConfig};
use node_runtime::seed::{RegistrySeed, SEED_ENV};
use node_runtime::{NodeRuntime, PARTITIONS_ENV};
use shared_bus::{InMemoryBroker, DEFAULT_PARTITIONS};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let path = config_path();
    let config = NodeConfig::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    let partitions = match std::env::var(PARTITIONS_ENV) {
        Ok(value) => value
            .parse::<u32>()
            .with_context(|| format!("{PARTITIONS_ENV} must be a positive integer"))?,
        Err(_) => DEFAULT_PARTITIONS,
    };

    let mut runtime = NodeRuntime::new(config, InMemoryBroker::with_partitions(partitions));

    if let Some(seed_path) = std::env::var_os(SEED_ENV) {
        let seed = RegistrySeed::load(&seed_path)
            .with_context(|| format!("Failed to load seed from {}", seed_path.to_string_lossy()))?;
        runtime.seed(seed);
    }

    runtime.start()?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
