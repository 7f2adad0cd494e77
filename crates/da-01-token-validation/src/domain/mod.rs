//! # Domain Layer
//!
//! Pure outcome classification with no I/O dependencies.

pub mod resolution;
