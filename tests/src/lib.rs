//! # Device-Access Test Suite
//!
//! Unified test crate.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Server + client wired over one in-memory broker
//! └── integration/      # Flows through the bus
//!     ├── token_flow.rs        # validation outcomes end to end
//!     └── transport_limits.rs  # pending bound and timeouts
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p da-tests
//! cargo test -p da-tests integration::transport_limits
//! cargo bench -p da-tests
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
