//! # Node Configuration
//!
//! Loaded from a TOML file. Every key is required; a missing or misspelled
//! key fails startup instead of falling back to a default.
//!
//! ## Config File Format
//!
//! ```toml
//! [node]
//! id = "tb-node-1"
//! group_id = "tb-node"
//!
//! [transport_api]
//! requests_topic = "tb.transport.api.requests"
//! responses_topic = "tb.transport.api.responses"
//! max_pending_requests = 10000
//! request_timeout = "10s"
//! request_poll_interval = "25ms"
//! request_auto_commit_interval = "100ms"
//! ```

use da_02_transport_api::TransportApiConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "DA_CONFIG";
/// Config file used when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config/transport.toml";

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub node: NodeIdentity,
    pub transport_api: TransportApiConfig,
}

/// Identity of this node on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeIdentity {
    /// Client id, used in logs and in this node's reply topic.
    pub id: String,
    /// Consumer group shared by all nodes serving the request topic.
    pub group_id: String,
}

impl NodeConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.id.trim().is_empty() {
            return Err(ConfigError::EmptyField("node.id"));
        }
        if self.node.group_id.trim().is_empty() {
            return Err(ConfigError::EmptyField("node.group_id"));
        }
        self.transport_api.validate()?;
        Ok(())
    }

    /// Topic on which this node receives responses to its own requests.
    pub fn reply_topic(&self) -> String {
        format!("{}.{}", self.transport_api.responses_topic, self.node.id)
    }
}

/// Path of the config file: `DA_CONFIG`, or the default location.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("Invalid transport_api section: {0}")]
    TransportApi(#[from] da_02_transport_api::ConfigError),
}
