//! # JSON Codec
//!
//! Encodes envelopes to the bytes stored on the bus and back.

use crate::envelope::Envelope;
use crate::errors::MessageError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode an envelope to bytes.
pub fn encode<T: Serialize>(envelope: &Envelope<T>) -> Result<Vec<u8>, MessageError> {
    serde_json::to_vec(envelope).map_err(|e| MessageError::Encode(e.to_string()))
}

/// Decode and version-check an envelope.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Envelope<T>, MessageError> {
    let envelope: Envelope<T> =
        serde_json::from_slice(bytes).map_err(|e| MessageError::Decode(e.to_string()))?;
    envelope.check_version()?;
    Ok(envelope)
}
