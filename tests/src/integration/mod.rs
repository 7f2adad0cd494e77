//! # Integration Flows
//!
//! Requests travel client → request topic → response template → service →
//! reply topic → client, all over the in-memory broker.

pub mod token_flow;
pub mod transport_limits;
