//! # Message Envelope
//!
//! The wrapper for every message exchanged over the transport API topics.
//!
//! ## Properties
//!
//! - **Versioning**: All messages include a `version` field for forward compatibility.
//! - **Correlation**: Requests carry a fresh `request_id`; the response echoes it.
//! - **Routing**: Requests name the topic their response is published to.

use crate::errors::MessageError;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// The message envelope for transport API requests and responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Protocol version. MUST be checked before the payload is used.
    pub version: u16,

    /// Correlation token.
    /// For requests: a newly generated UUID.
    /// For responses: the UUID from the original request.
    pub request_id: Uuid,

    /// Topic the response should be published to.
    /// Absent on responses.
    #[serde(default)]
    pub response_topic: Option<String>,

    /// Unix timestamp (milliseconds) when the envelope was created.
    pub timestamp: u64,

    /// The actual message payload.
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Current protocol version.
    pub const CURRENT_VERSION: u16 = 1;

    /// Wrap a request payload with a fresh correlation token.
    pub fn request(payload: T, response_topic: impl Into<String>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            request_id: Uuid::new_v4(),
            response_topic: Some(response_topic.into()),
            timestamp: now_millis(),
            payload,
        }
    }

    /// Wrap a response payload, echoing the request's correlation token.
    pub fn response(request_id: Uuid, payload: T) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            request_id,
            response_topic: None,
            timestamp: now_millis(),
            payload,
        }
    }

    /// Reject envelopes this node cannot interpret.
    pub fn check_version(&self) -> Result<(), MessageError> {
        if self.version != Self::CURRENT_VERSION {
            return Err(MessageError::UnsupportedVersion {
                received: self.version,
                supported: Self::CURRENT_VERSION,
            });
        }
        if self.request_id.is_nil() {
            return Err(MessageError::MissingRequestId);
        }
        Ok(())
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
