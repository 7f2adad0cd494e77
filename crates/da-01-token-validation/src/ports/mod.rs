//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API that the transport uses
//! - **Outbound (Driven)**: Stores and utilities this subsystem needs

pub mod inbound;
pub mod outbound;
