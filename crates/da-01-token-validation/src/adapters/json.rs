//! JSON payload serializer.

use crate::ports::outbound::{PayloadSerializer, SerializeError};

/// Serializes payloads as compact JSON text. Stateless; `null` becomes `"null"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPayloadSerializer;

impl PayloadSerializer for JsonPayloadSerializer {
    fn to_text(&self, payload: &serde_json::Value) -> Result<String, SerializeError> {
        serde_json::to_string(payload).map_err(|e| SerializeError(e.to_string()))
    }
}
