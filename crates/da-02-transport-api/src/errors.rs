//! # Transport Errors

use crate::domain::correlation::CorrelationId;
use shared_bus::BusError;
use shared_types::MessageError;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to callers of the request template.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response arrived in time.
    #[error("Request {correlation_id} timed out after {timeout:?}")]
    Timeout {
        correlation_id: CorrelationId,
        timeout: Duration,
    },

    /// The pending entry was dropped before a response arrived.
    #[error("Request {0} was cancelled")]
    Cancelled(CorrelationId),

    /// The message channel failed.
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// The message could not be encoded or decoded.
    #[error("Message error: {0}")]
    Message(#[from] MessageError),
}
