//! # In-Memory Stores
//!
//! Credential store and device directory held in process memory. Used by
//! the node runtime when no external registry is configured, and by tests.

use crate::ports::outbound::{DeviceCredentialsService, DeviceService};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Device, DeviceCredentials, DeviceId, LookupError};
use std::collections::HashMap;

/// Credentials indexed by credentials id (the token value).
#[derive(Default)]
pub struct InMemoryCredentialsStore {
    by_credentials_id: RwLock<HashMap<String, DeviceCredentials>>,
}

impl InMemoryCredentialsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the credentials registered under their credentials id.
    pub fn insert(&self, credentials: DeviceCredentials) {
        self.by_credentials_id
            .write()
            .insert(credentials.credentials_id.clone(), credentials);
    }

    /// Remove the credentials registered under `credentials_id`.
    pub fn remove(&self, credentials_id: &str) -> Option<DeviceCredentials> {
        self.by_credentials_id.write().remove(credentials_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_credentials_id.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DeviceCredentialsService for InMemoryCredentialsStore {
    fn find_by_credentials_id(
        &self,
        credentials_id: &str,
    ) -> Result<Option<DeviceCredentials>, LookupError> {
        Ok(self.by_credentials_id.read().get(credentials_id).cloned())
    }
}

/// Devices indexed by id.
#[derive(Default)]
pub struct InMemoryDeviceStore {
    by_id: RwLock<HashMap<DeviceId, Device>>,
}

impl InMemoryDeviceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a device.
    pub fn insert(&self, device: Device) {
        self.by_id.write().insert(device.id, device);
    }

    /// Delete a device. Its credentials are left dangling on purpose:
    /// lookups through them must resolve to no device.
    pub fn remove(&self, device_id: DeviceId) -> Option<Device> {
        self.by_id.write().remove(&device_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DeviceService for InMemoryDeviceStore {
    async fn find_by_id(&self, device_id: DeviceId) -> Result<Option<Device>, LookupError> {
        Ok(self.by_id.read().get(&device_id).cloned())
    }
}
