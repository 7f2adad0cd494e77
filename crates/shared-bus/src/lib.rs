//! # Shared Bus - Partitioned Message Log
//!
//! The message channel the transport API consumes requests from and
//! publishes responses to.
//!
//! ## Model
//!
//! ```text
//! ┌──────────────┐   send(topic, key)   ┌─────────────────────────┐
//! │  Publisher   │ ───────────────────→ │ topic                   │
//! └──────────────┘                      │  ├─ partition 0: [0..n) │
//!                                       │  └─ partition 1: [0..m) │
//!                                       └─────────────────────────┘
//!                                                 │ poll()
//!                                                 ▼
//!                                      ┌────────────────────────┐
//!                                      │ PartitionConsumer      │
//!                                      │ (group, position)      │──→ commit()
//!                                      └────────────────────────┘
//! ```
//!
//! - Records with the same key land on the same partition.
//! - Each consumer group keeps one committed offset per partition.
//! - Delivery is at-least-once: records read after the last commit are
//!   delivered again to the next consumer of the group.
//! - Each partition retains a bounded tail of its log; a topic nobody reads
//!   does not grow without limit.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod publisher;
pub mod subscriber;

use thiserror::Error;

// Re-export main types
pub use publisher::{InMemoryBroker, RecordPublisher};
pub use subscriber::{PartitionConsumer, RecordConsumer};

/// Partition count for topics created on first use.
pub const DEFAULT_PARTITIONS: u32 = 1;

/// Records kept per partition before the oldest are dropped.
pub const DEFAULT_RETENTION: usize = 100_000;

/// Errors from bus operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The broker was closed.
    #[error("Broker closed")]
    Closed,

    /// The topic does not exist.
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// The partition does not exist.
    #[error("Unknown partition {partition} for topic {topic}")]
    UnknownPartition { topic: String, partition: u32 },
}

/// A record stored in a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
    pub key: Option<String>,
    pub value: Vec<u8>,
}

/// Where a published record was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMetadata {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
}
