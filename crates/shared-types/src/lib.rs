//! # Shared Types Crate
//!
//! Device registry entities, transport API payloads, and the `Envelope<T>`
//! wrapper shared by the handler, the transport and the test suite.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Envelope Correlation**: The `Envelope<T>` `request_id` is the only
//!   correlation token; payloads never duplicate it.
//! - **Wire-split identifiers**: UUIDs travel as signed 64-bit halves.

pub mod codec;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod ipc;

pub use entities::*;
pub use envelope::Envelope;
pub use errors::*;
pub use ipc::*;
