//! # Node Runtime Library
//!
//! Wires the token validation service behind the transport API response
//! template. The `main.rs` binary drives it; the runtime is exposed as a
//! library for tests.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`DA_CONFIG`)
//! 2. Create the broker handle and the registry stores
//! 3. Seed the stores (`DA_SEED_FILE`, optional)
//! 4. Open one request consumer per partition for the node's group
//! 5. Start the response template
//! 6. Run until Ctrl+C, then signal shutdown and join the tasks

pub mod config;
pub mod seed;

use anyhow::{Context, Result};
use da_01_token_validation::{
    InMemoryCredentialsStore, InMemoryDeviceStore, TokenValidationService, TransportApiHandler,
};
use da_02_transport_api::{ResponseTemplate, StatsSnapshot};
use shared_bus::{InMemoryBroker, RecordConsumer};
use shared_types::{TransportApiRequest, TransportApiResponse};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub use config::{NodeConfig, NodeIdentity};
pub use seed::RegistrySeed;

/// Environment variable overriding the broker partition count.
pub const PARTITIONS_ENV: &str = "DA_PARTITIONS";

/// How long shutdown waits for each task to stop.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub type TokenValidationTemplate = ResponseTemplate<TransportApiRequest, TransportApiResponse>;

/// The transport node: registry stores, validation service and the template
/// serving it.
pub struct NodeRuntime {
    config: NodeConfig,
    broker: InMemoryBroker,
    credentials: Arc<InMemoryCredentialsStore>,
    devices: Arc<InMemoryDeviceStore>,
    template: Arc<TokenValidationTemplate>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig, broker: InMemoryBroker) -> Self {
        info!(node_id = %config.node.id, "Creating transport node runtime");

        let credentials = Arc::new(InMemoryCredentialsStore::new());
        let devices = Arc::new(InMemoryDeviceStore::new());
        let service = Arc::new(TokenValidationService::new(
            Arc::clone(&credentials),
            Arc::clone(&devices),
        ));
        let template: Arc<TokenValidationTemplate> = Arc::new(ResponseTemplate::new(
            config.transport_api.clone(),
            Arc::new(TransportApiHandler::new(service)),
            Arc::new(broker.clone()),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            broker,
            credentials,
            devices,
            template,
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        }
    }

    /// Load seed records into the registry stores.
    pub fn seed(&self, seed: RegistrySeed) {
        let (devices, credentials) = seed.apply(&self.credentials, &self.devices);
        info!(devices = devices, credentials = credentials, "Registry seeded");
    }

    /// Open the request consumers and start serving.
    pub fn start(&mut self) -> Result<()> {
        let api = &self.config.transport_api;
        let consumers: Vec<Box<dyn RecordConsumer>> = self
            .broker
            .consumers(&self.config.node.group_id, &api.requests_topic)
            .with_context(|| format!("Failed to subscribe to {}", api.requests_topic))?
            .into_iter()
            .map(|c| Box::new(c) as Box<dyn RecordConsumer>)
            .collect();

        info!(
            node_id = %self.config.node.id,
            group_id = %self.config.node.group_id,
            requests_topic = %api.requests_topic,
            responses_topic = %api.responses_topic,
            "Transport node starting"
        );

        let handles = self.template.start(consumers, self.shutdown_rx.clone());
        self.tasks.extend(handles);
        Ok(())
    }

    /// Signal shutdown and wait for the template tasks to stop.
    pub async fn shutdown(self) -> StatsSnapshot {
        info!("Initiating graceful shutdown...");

        if self.shutdown_tx.send(true).is_err() {
            warn!("No task was listening for shutdown");
        }
        for task in self.tasks {
            if tokio::time::timeout(SHUTDOWN_GRACE, task).await.is_err() {
                warn!("Task did not stop within the shutdown grace period");
            }
        }

        let stats = self.template.stats();
        info!(
            completed = stats.completed,
            timed_out = stats.timed_out,
            skipped = stats.skipped,
            "Shutdown complete"
        );
        stats
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn broker(&self) -> &InMemoryBroker {
        &self.broker
    }

    pub fn credentials(&self) -> &Arc<InMemoryCredentialsStore> {
        &self.credentials
    }

    pub fn devices(&self) -> &Arc<InMemoryDeviceStore> {
        &self.devices
    }

    pub fn template(&self) -> &Arc<TokenValidationTemplate> {
        &self.template
    }
}
