//! # Core Domain Entities
//!
//! Device registry records shared by the validation handler and the
//! in-memory store adapters.
//!
//! ## Clusters
//!
//! - **Identity**: `TenantId`, `DeviceId`, `CustomerId`, `CredentialsId`
//! - **Credentials**: `DeviceCredentials`, `CredentialsType`
//! - **Devices**: `Device`
//!
//! All identifiers are 128-bit UUIDs. On the wire they travel as a pair of
//! signed 64-bit halves (most/least significant bits), see [`UuidHalves`].

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A UUID split into its most- and least-significant halves.
///
/// The halves are signed so that they round-trip with peers that store
/// them as `int64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UuidHalves {
    /// Upper 64 bits.
    pub msb: i64,
    /// Lower 64 bits.
    pub lsb: i64,
}

impl UuidHalves {
    /// Split a UUID into its halves.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        let (hi, lo) = uuid.as_u64_pair();
        Self {
            msb: hi as i64,
            lsb: lo as i64,
        }
    }

    /// Reassemble the UUID.
    #[must_use]
    pub fn to_uuid(self) -> Uuid {
        Uuid::from_u64_pair(self.msb as u64, self.lsb as u64)
    }
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// The underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Wire form of this identifier.
            #[must_use]
            pub fn halves(&self) -> UuidHalves {
                UuidHalves::from_uuid(self.0)
            }

            /// Rebuild an identifier from its wire halves.
            #[must_use]
            pub fn from_halves(msb: i64, lsb: i64) -> Self {
                Self(UuidHalves { msb, lsb }.to_uuid())
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifier of the tenant that owns a device.
    TenantId
);
uuid_id!(
    /// Identifier of a device.
    DeviceId
);
uuid_id!(
    /// Identifier of the customer a device is assigned to.
    CustomerId
);
uuid_id!(
    /// Identifier of a device credentials record.
    CredentialsId
);

// =============================================================================
// CLUSTER B: CREDENTIALS
// =============================================================================

/// The scheme a device uses to authenticate.
///
/// Only [`CredentialsType::AccessToken`] identifies a device by its token
/// value alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialsType {
    /// Opaque bearer token.
    AccessToken,
    /// X.509 certificate, indexed by certificate hash.
    X509Certificate,
    /// MQTT client id / username / password triple.
    MqttBasic,
}

impl CredentialsType {
    /// Whether the credential value alone authorizes a device lookup.
    #[must_use]
    pub fn is_access_token(&self) -> bool {
        matches!(self, CredentialsType::AccessToken)
    }
}

/// A device credentials record as held by the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCredentials {
    /// Record identifier.
    pub id: CredentialsId,
    /// The device these credentials belong to.
    pub device_id: DeviceId,
    /// Authentication scheme.
    pub credentials_type: CredentialsType,
    /// Lookup key: the token value, or the certificate hash.
    pub credentials_id: String,
    /// Scheme-specific secret material, if any.
    #[serde(default)]
    pub credentials_value: Option<String>,
}

impl DeviceCredentials {
    /// Build an access-token credential for `device_id`.
    #[must_use]
    pub fn access_token(device_id: DeviceId, token: impl Into<String>) -> Self {
        Self {
            id: CredentialsId::random(),
            device_id,
            credentials_type: CredentialsType::AccessToken,
            credentials_id: token.into(),
            credentials_value: None,
        }
    }
}

// =============================================================================
// CLUSTER C: DEVICES
// =============================================================================

/// A device record as held by the device directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Device identifier.
    pub id: DeviceId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Assigned customer, if any.
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    /// Display name, unique per tenant.
    pub name: String,
    /// Device type label, e.g. `"thermostat"`.
    #[serde(rename = "type")]
    pub device_type: String,
    /// Optional secondary label.
    #[serde(default)]
    pub label: Option<String>,
    /// Arbitrary structured payload attached to the device.
    #[serde(default)]
    pub additional_info: serde_json::Value,
}

impl Device {
    /// Create a device with no customer, label or additional info.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        id: DeviceId,
        name: impl Into<String>,
        device_type: impl Into<String>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            customer_id: None,
            name: name.into(),
            device_type: device_type.into(),
            label: None,
            additional_info: serde_json::Value::Null,
        }
    }

    /// Attach an additional-info payload.
    #[must_use]
    pub fn with_additional_info(mut self, additional_info: serde_json::Value) -> Self {
        self.additional_info = additional_info;
        self
    }
}
