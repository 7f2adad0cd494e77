//! # Resolution Outcomes
//!
//! Every way a token validation can end. Only [`Resolution::Found`] carries a
//! device; every other outcome becomes the same empty response on the wire
//! and differs only in how loudly it is logged.

use shared_types::{CredentialsType, DeviceId, DeviceInfo, LookupError, TransportApiResponse};

/// How loudly an outcome is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Expected miss (unknown token, deleted device).
    Trace,
    /// Unexpected failure (store error, unserializable payload).
    Warn,
}

/// The outcome of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The token identifies this device.
    Found(DeviceInfo),
    /// The request kind is not served by this handler.
    UnsupportedRequest(&'static str),
    /// No credential is registered under the token.
    UnknownToken,
    /// The credential exists but is not an access token.
    WrongCredentialsType(CredentialsType),
    /// The credential's device no longer exists.
    DeviceMissing(DeviceId),
    /// The device's additional info could not be serialized.
    SerializationFailed { device_id: DeviceId, reason: String },
    /// The credential store or device directory failed.
    LookupFailed(LookupError),
}

impl Resolution {
    /// Log severity for this outcome.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Resolution::SerializationFailed { .. } | Resolution::LookupFailed(_) => Severity::Warn,
            _ => Severity::Trace,
        }
    }

    /// Collapse into the wire response.
    #[must_use]
    pub fn into_response(self) -> TransportApiResponse {
        match self {
            Resolution::Found(info) => TransportApiResponse::found(info),
            _ => TransportApiResponse::empty(),
        }
    }
}
