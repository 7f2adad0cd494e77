//! Correlation ID: the envelope `request_id` seen from the transport.

use serde::{Deserialize, Serialize};
use shared_types::Envelope;
use std::fmt;
use uuid::Uuid;

/// Matches a response to the request it answers.
///
/// Also used as the record key on both topics, so a request and its
/// response land on the same-numbered partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Fresh random ID for an outgoing request.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The ID an envelope travels under.
    pub fn of<T>(envelope: &Envelope<T>) -> Self {
        Self(envelope.request_id)
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Key for records published under this ID.
    pub fn record_key(&self) -> String {
        self.0.hyphenated().to_string()
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<CorrelationId> for Uuid {
    fn from(id: CorrelationId) -> Self {
        id.0
    }
}
