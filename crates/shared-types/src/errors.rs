//! # Error Types
//!
//! Defines error types shared by the handler, the transport and the stores.

use thiserror::Error;

/// Errors raised while encoding or decoding transport messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessageError {
    /// Message version not supported.
    #[error("Unsupported version: received {received}, supported {supported}")]
    UnsupportedVersion { received: u16, supported: u16 },

    /// Envelope carries no usable correlation token.
    #[error("Missing request id")]
    MissingRequestId,

    /// Payload could not be decoded.
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Payload could not be encoded.
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Errors from the credential store or the device directory.
///
/// The validation handler never propagates these; they collapse into an
/// empty response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The backing store returned a record it could not read.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}
