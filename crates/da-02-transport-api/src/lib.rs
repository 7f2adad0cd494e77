//! # DA-02 Transport API - Correlated Request/Response over the Bus
//!
//! Serves requests that arrive on a partitioned topic and answers each one on
//! the reply topic it names, under the request's correlation ID.
//!
//! ## Architecture
//!
//! ```text
//!  node A (caller)                      bus                    node B (server)
//! ┌─────────────────┐  request + id + reply topic  ┌─────────────────────────┐
//! │ RequestTemplate │ ───────────────────────────→ │ ResponseTemplate        │
//! │  pending table  │                              │  bounded pending slots  │
//! │  (oneshot/id)   │ ←─────────────────────────── │  sweep + timeouts       │
//! └─────────────────┘        response + id         │          │              │
//!                                                  │          ▼              │
//!                                                  │  dyn RequestHandler     │
//!                                                  └─────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - At most `max_pending_requests` requests are dispatched and unanswered.
//! - Every dispatched request receives exactly one response: the handler's
//!   result, or the default response once `request_timeout` has elapsed.
//! - Records that cannot be decoded are logged and skipped.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod template;

pub use config::{ConfigError, TransportApiConfig};
pub use domain::{CorrelationId, StatsSnapshot};
pub use errors::TransportError;
pub use ports::handler::RequestHandler;
pub use template::{RequestTemplate, ResponseTemplate};
