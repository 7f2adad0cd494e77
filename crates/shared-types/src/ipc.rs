//! # Transport API Payloads
//!
//! Request and response payloads carried inside [`crate::Envelope`].
//!
//! ## Design Rules
//!
//! - Payloads MUST NOT carry correlation data; the envelope's `request_id` is
//!   authoritative.
//! - Unknown request kinds decode to [`TransportApiRequest::Unsupported`]
//!   instead of failing, so newer callers never poison the request topic.

use crate::entities::{Device, UuidHalves};
use serde::{Deserialize, Serialize};

// =============================================================================
// REQUESTS
// =============================================================================

/// A request addressed to the transport API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportApiRequest {
    /// Resolve an access token to the device it identifies.
    ValidateDeviceToken(ValidateDeviceTokenRequest),
    /// Resolve an X.509 certificate hash to a device. Not served by this node.
    ValidateX509Certificate(ValidateX509CertificateRequest),
    /// Any request kind this node does not recognize.
    #[serde(other)]
    Unsupported,
}

/// Token validation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateDeviceTokenRequest {
    /// The opaque credential token presented by the device.
    pub token: String,
}

/// Certificate validation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateX509CertificateRequest {
    /// Hash of the presented certificate.
    pub hash: String,
}

impl TransportApiRequest {
    /// Shorthand for a token validation request.
    pub fn validate_token(token: impl Into<String>) -> Self {
        Self::ValidateDeviceToken(ValidateDeviceTokenRequest {
            token: token.into(),
        })
    }

    /// Short name used in log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidateDeviceToken(_) => "validate_device_token",
            Self::ValidateX509Certificate(_) => "validate_x509_certificate",
            Self::Unsupported => "unsupported",
        }
    }
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Device description returned for a successfully validated credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub tenant_id_msb: i64,
    pub tenant_id_lsb: i64,
    pub device_id_msb: i64,
    pub device_id_lsb: i64,
    pub device_name: String,
    pub device_type: String,
    /// The device's additional info, serialized to text.
    pub additional_info: String,
}

impl DeviceInfo {
    /// Describe `device`, with `additional_info` already serialized.
    #[must_use]
    pub fn from_device(device: &Device, additional_info: String) -> Self {
        let tenant = device.tenant_id.halves();
        let id = device.id.halves();
        Self {
            tenant_id_msb: tenant.msb,
            tenant_id_lsb: tenant.lsb,
            device_id_msb: id.msb,
            device_id_lsb: id.lsb,
            device_name: device.name.clone(),
            device_type: device.device_type.clone(),
            additional_info,
        }
    }

    /// Tenant id as halves.
    #[must_use]
    pub fn tenant_id(&self) -> UuidHalves {
        UuidHalves {
            msb: self.tenant_id_msb,
            lsb: self.tenant_id_lsb,
        }
    }

    /// Device id as halves.
    #[must_use]
    pub fn device_id(&self) -> UuidHalves {
        UuidHalves {
            msb: self.device_id_msb,
            lsb: self.device_id_lsb,
        }
    }
}

/// Result of a token validation. `device_info: None` means "no match".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateDeviceTokenResponse {
    #[serde(default)]
    pub device_info: Option<DeviceInfo>,
}

/// A response from the transport API.
///
/// The default value is the empty response: it is what the handler returns
/// for every miss or failure, and what the transport publishes on timeout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportApiResponse {
    pub validate_token_response: ValidateDeviceTokenResponse,
}

impl TransportApiResponse {
    /// The "no match" response.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A response identifying a device.
    #[must_use]
    pub fn found(device_info: DeviceInfo) -> Self {
        Self {
            validate_token_response: ValidateDeviceTokenResponse {
                device_info: Some(device_info),
            },
        }
    }

    /// Whether this response identifies no device.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validate_token_response.device_info.is_none()
    }

    /// The identified device, if any.
    #[must_use]
    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.validate_token_response.device_info.as_ref()
    }
}
