//! # Registry Seed
//!
//! Optional JSON file loaded into the in-memory credential store and device
//! directory at startup.
//!
//! ```json
//! {
//!   "devices": [
//!     { "id": "…", "tenant_id": "…", "name": "sensor-1", "type": "thermostat",
//!       "additional_info": { "fw": "1.2" } }
//!   ],
//!   "credentials": [
//!     { "id": "…", "device_id": "…", "credentials_type": "ACCESS_TOKEN",
//!       "credentials_id": "abc123" }
//!   ]
//! }
//! ```

use da_01_token_validation::{InMemoryCredentialsStore, InMemoryDeviceStore};
use serde::Deserialize;
use shared_types::{Device, DeviceCredentials};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment variable naming the seed file.
pub const SEED_ENV: &str = "DA_SEED_FILE";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySeed {
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub credentials: Vec<DeviceCredentials>,
}

impl RegistrySeed {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SeedError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| SeedError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| SeedError::Parse(e.to_string()))
    }

    /// Insert every record into the stores. Returns (devices, credentials).
    pub fn apply(
        self,
        credentials: &InMemoryCredentialsStore,
        devices: &InMemoryDeviceStore,
    ) -> (usize, usize) {
        let counts = (self.devices.len(), self.credentials.len());
        for device in self.devices {
            devices.insert(device);
        }
        for record in self.credentials {
            credentials.insert(record);
        }
        counts
    }
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse seed: {0}")]
    Parse(String),
}
