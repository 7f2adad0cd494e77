//! # Token Validation Subsystem (DA-01)
//!
//! Answers "is this device token valid, and which device does it identify?"
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): Outcome classification, no I/O
//! - **Ports Layer** (`ports/`): Inbound API and outbound store traits
//! - **Service Layer** (`service.rs`): The two-step credential → device lookup
//! - **Adapters** (`adapters/`): JSON serializer, in-memory stores, transport handler
//!
//! ## Contract
//!
//! - Every request completes; misses and failures are the empty response.
//! - Not found, wrong credential type, lookup errors and serialization
//!   errors are indistinguishable on the wire and differ only in log level.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::json::JsonPayloadSerializer;
pub use adapters::memory::{InMemoryCredentialsStore, InMemoryDeviceStore};
pub use adapters::transport::TransportApiHandler;
pub use domain::resolution::{Resolution, Severity};
pub use ports::inbound::TokenValidationApi;
pub use ports::outbound::{DeviceCredentialsService, DeviceService, PayloadSerializer, SerializeError};
pub use service::TokenValidationService;
