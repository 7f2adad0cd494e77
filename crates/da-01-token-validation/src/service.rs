//! # Token Validation Service
//!
//! Application service layer that implements the `TokenValidationApi` trait.
//!
//! ## Flow
//!
//! ```text
//! ValidateDeviceToken{token}
//!       │
//!       ▼  credentials store (sync)
//! DeviceCredentials ── absent / not ACCESS_TOKEN ──→ Empty
//!       │
//!       ▼  device directory (async, the only suspension point)
//! Device ── absent ──→ Empty (trace)
//!       │
//!       ▼  payload serializer
//! DeviceInfo ── serialize error ──→ Empty (warn)
//!       │
//!       ▼
//! Found(DeviceInfo)
//! ```
//!
//! The service holds no per-request state, never retries, and is safe to
//! call again for a redelivered request.

use crate::adapters::json::JsonPayloadSerializer;
use crate::domain::resolution::{Resolution, Severity};
use crate::ports::inbound::TokenValidationApi;
use crate::ports::outbound::{DeviceCredentialsService, DeviceService, PayloadSerializer};
use async_trait::async_trait;
use shared_types::{DeviceId, DeviceInfo, TransportApiRequest};
use std::sync::Arc;
use tracing::{trace, warn};

/// Token Validation Service.
///
/// Resolves an access token to the device it identifies through the
/// credential store and the device directory.
pub struct TokenValidationService<C, D, S = JsonPayloadSerializer> {
    credentials: Arc<C>,
    devices: Arc<D>,
    serializer: S,
}

impl<C, D> TokenValidationService<C, D, JsonPayloadSerializer>
where
    C: DeviceCredentialsService,
    D: DeviceService,
{
    /// Create a service that serializes additional info as JSON.
    pub fn new(credentials: Arc<C>, devices: Arc<D>) -> Self {
        Self::with_serializer(credentials, devices, JsonPayloadSerializer)
    }
}

impl<C, D, S> TokenValidationService<C, D, S>
where
    C: DeviceCredentialsService,
    D: DeviceService,
    S: PayloadSerializer,
{
    /// Create a service with a custom payload serializer.
    pub fn with_serializer(credentials: Arc<C>, devices: Arc<D>, serializer: S) -> Self {
        Self {
            credentials,
            devices,
            serializer,
        }
    }

    async fn validate_token(&self, token: &str) -> Resolution {
        let credentials = match self.credentials.find_by_credentials_id(token) {
            Ok(Some(credentials)) => credentials,
            Ok(None) => return Resolution::UnknownToken,
            Err(e) => return Resolution::LookupFailed(e),
        };

        if !credentials.credentials_type.is_access_token() {
            return Resolution::WrongCredentialsType(credentials.credentials_type);
        }

        self.device_info(credentials.device_id).await
    }

    async fn device_info(&self, device_id: DeviceId) -> Resolution {
        let device = match self.devices.find_by_id(device_id).await {
            Ok(Some(device)) => device,
            Ok(None) => return Resolution::DeviceMissing(device_id),
            Err(e) => return Resolution::LookupFailed(e),
        };

        match self.serializer.to_text(&device.additional_info) {
            Ok(additional_info) => Resolution::Found(DeviceInfo::from_device(&device, additional_info)),
            Err(e) => Resolution::SerializationFailed {
                device_id,
                reason: e.to_string(),
            },
        }
    }
}

#[async_trait]
impl<C, D, S> TokenValidationApi for TokenValidationService<C, D, S>
where
    C: DeviceCredentialsService,
    D: DeviceService,
    S: PayloadSerializer,
{
    async fn resolve(&self, request: &TransportApiRequest) -> Resolution {
        let resolution = match request {
            TransportApiRequest::ValidateDeviceToken(msg) => self.validate_token(&msg.token).await,
            other => Resolution::UnsupportedRequest(other.kind()),
        };
        log_resolution(&resolution);
        resolution
    }
}

fn log_resolution(resolution: &Resolution) {
    match (resolution, resolution.severity()) {
        (Resolution::Found(info), _) => trace!(
            device_id = %info.device_id().to_uuid(),
            device_name = %info.device_name,
            "Token resolved to device"
        ),
        (Resolution::DeviceMissing(device_id), _) => {
            trace!(device_id = %device_id, "Credential refers to a missing device")
        }
        (Resolution::SerializationFailed { device_id, reason }, _) => {
            warn!(device_id = %device_id, error = %reason, "Failed to serialize device additional info")
        }
        (other, Severity::Warn) => warn!(outcome = ?other, "Token validation failed"),
        (other, Severity::Trace) => trace!(outcome = ?other, "Token not accepted"),
    }
}
