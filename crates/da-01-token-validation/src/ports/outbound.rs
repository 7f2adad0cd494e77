//! # Outbound Ports (Driven Ports / SPI)
//!
//! Traits that define dependencies this subsystem needs.

use async_trait::async_trait;
use shared_types::{Device, DeviceCredentials, DeviceId, LookupError};
use thiserror::Error;

/// Read access to device credentials.
///
/// Synchronous: a blocking implementation runs on the handler's worker task.
pub trait DeviceCredentialsService: Send + Sync {
    /// Find the credentials registered under `credentials_id`
    /// (the token value for access tokens).
    fn find_by_credentials_id(
        &self,
        credentials_id: &str,
    ) -> Result<Option<DeviceCredentials>, LookupError>;
}

/// Read access to the device directory.
#[async_trait]
pub trait DeviceService: Send + Sync {
    /// Find a device by id. `Ok(None)` means the device does not exist.
    async fn find_by_id(&self, device_id: DeviceId) -> Result<Option<Device>, LookupError>;
}

/// Error from payload serialization.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to serialize payload: {0}")]
pub struct SerializeError(pub String);

/// Serializes a device's additional info to text.
///
/// Implementations are stateless and shared between all requests.
pub trait PayloadSerializer: Send + Sync {
    fn to_text(&self, payload: &serde_json::Value) -> Result<String, SerializeError>;
}
