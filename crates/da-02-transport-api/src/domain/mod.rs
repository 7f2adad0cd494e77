//! Domain types for the transport API.
//!
//! Correlation IDs, the caller-side pending table, and template counters.

pub mod correlation;
pub mod pending;
pub mod stats;

pub use correlation::CorrelationId;
pub use pending::{run_eviction, Delivery, PendingRequestStore, PendingStats, Reply};
pub use stats::{StatsSnapshot, TemplateStats};
