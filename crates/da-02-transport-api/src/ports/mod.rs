//! # Ports Layer
//!
//! The handler seam between the transport and the service it serves.

pub mod handler;
