//! # Adapters Module
//!
//! Infrastructure adapters implementing the ports.

pub mod json;
pub mod memory;
pub mod transport;
