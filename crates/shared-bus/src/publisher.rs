//! # Record Publisher
//!
//! Defines the publishing side of the bus and the in-memory broker.

use crate::subscriber::PartitionConsumer;
use crate::{BusError, Record, RecordMetadata, DEFAULT_PARTITIONS, DEFAULT_RETENTION};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, trace, warn};

/// Trait for publishing records to a topic.
#[async_trait]
pub trait RecordPublisher: Send + Sync {
    /// Append a record to `topic`.
    ///
    /// Records with the same key always land on the same partition.
    async fn send(
        &self,
        topic: &str,
        key: Option<&str>,
        value: Vec<u8>,
    ) -> Result<RecordMetadata, BusError>;

    /// Get the total number of records published.
    fn records_published(&self) -> u64;
}

/// One partition: the retained tail of an append-only log.
#[derive(Clone, Default)]
struct PartitionLog {
    /// Offset of the oldest retained record.
    base: u64,
    records: VecDeque<Record>,
}

impl PartitionLog {
    fn end(&self) -> u64 {
        self.base + self.records.len() as u64
    }

    /// Drop the oldest records until at most `retention` remain.
    fn truncate_front(&mut self, retention: usize) -> usize {
        let excess = self.records.len().saturating_sub(retention);
        self.records.drain(..excess);
        self.base += excess as u64;
        excess
    }
}

#[derive(Default)]
struct Topic {
    partitions: Vec<PartitionLog>,
    next_unkeyed: u64,
}

#[derive(Default)]
pub(crate) struct BrokerState {
    topics: HashMap<String, Topic>,
    /// Committed offsets keyed by (group, topic, partition).
    committed: HashMap<(String, String, u32), u64>,
}

pub(crate) struct BrokerInner {
    pub(crate) state: RwLock<BrokerState>,
    pub(crate) notify: Notify,
    pub(crate) closed: AtomicBool,
    default_partitions: u32,
    retention: usize,
    records_published: AtomicU64,
}

impl BrokerInner {
    /// Records of `topic`/`partition` from `offset`, at most `max`.
    ///
    /// An offset below the retained range reads from the oldest record.
    pub(crate) fn fetch(
        &self,
        topic: &str,
        partition: u32,
        offset: u64,
        max: usize,
    ) -> Result<Vec<Record>, BusError> {
        let state = self.state.read();
        let Some(t) = state.topics.get(topic) else {
            return Ok(Vec::new());
        };
        let log = t
            .partitions
            .get(partition as usize)
            .ok_or_else(|| BusError::UnknownPartition {
                topic: topic.to_string(),
                partition,
            })?;
        let skip = offset.saturating_sub(log.base) as usize;
        Ok(log
            .records
            .iter()
            .skip(skip)
            .take(max)
            .cloned()
            .collect())
    }

    pub(crate) fn commit(&self, group: &str, topic: &str, partition: u32, offset: u64) {
        let mut state = self.state.write();
        state
            .committed
            .insert((group.to_string(), topic.to_string(), partition), offset);
    }

    pub(crate) fn committed(&self, group: &str, topic: &str, partition: u32) -> Option<u64> {
        let state = self.state.read();
        state
            .committed
            .get(&(group.to_string(), topic.to_string(), partition))
            .copied()
    }
}

/// In-memory partitioned log.
///
/// Behaves like a single-node broker: topics are created on first use with
/// the default partition count, consumer groups keep committed offsets, and
/// a consumer created for a group resumes from the last committed offset.
/// Cloning yields another handle to the same broker.
///
/// Each partition retains at most a fixed number of records; older ones are
/// dropped on append whether or not any group has consumed them. Offsets
/// keep counting, and a consumer positioned before the retained range
/// resumes at the oldest record.
#[derive(Clone)]
pub struct InMemoryBroker {
    inner: Arc<BrokerInner>,
}

impl InMemoryBroker {
    /// Create a new broker with default partition count.
    #[must_use]
    pub fn new() -> Self {
        Self::with_partitions(DEFAULT_PARTITIONS)
    }

    /// Create a new broker whose auto-created topics have `partitions` partitions.
    #[must_use]
    pub fn with_partitions(partitions: u32) -> Self {
        Self::with_retention(partitions, DEFAULT_RETENTION)
    }

    /// Create a new broker keeping at most `retention` records per partition.
    #[must_use]
    pub fn with_retention(partitions: u32, retention: usize) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                state: RwLock::new(BrokerState::default()),
                notify: Notify::new(),
                closed: AtomicBool::new(false),
                default_partitions: partitions.max(1),
                retention: retention.max(1),
                records_published: AtomicU64::new(0),
            }),
        }
    }

    /// Create `topic` with an explicit partition count. No-op if it exists.
    pub fn create_topic(&self, topic: &str, partitions: u32) {
        let mut state = self.inner.state.write();
        state.topics.entry(topic.to_string()).or_insert_with(|| {
            debug!(topic = topic, partitions = partitions, "Topic created");
            Topic {
                partitions: vec![PartitionLog::default(); partitions.max(1) as usize],
                next_unkeyed: 0,
            }
        });
    }

    /// Number of partitions of `topic`, creating it if needed.
    #[must_use]
    pub fn partitions(&self, topic: &str) -> u32 {
        self.create_topic(topic, self.inner.default_partitions);
        let state = self.inner.state.read();
        state
            .topics
            .get(topic)
            .map(|t| t.partitions.len() as u32)
            .unwrap_or(self.inner.default_partitions)
    }

    /// Open a consumer on one partition of `topic` for consumer `group`.
    ///
    /// The consumer starts at the group's committed offset, or at the
    /// beginning of the partition if nothing was committed yet.
    pub fn consumer(
        &self,
        group: &str,
        topic: &str,
        partition: u32,
    ) -> Result<PartitionConsumer, BusError> {
        let count = self.partitions(topic);
        if partition >= count {
            return Err(BusError::UnknownPartition {
                topic: topic.to_string(),
                partition,
            });
        }
        let position = self.inner.committed(group, topic, partition).unwrap_or(0);
        debug!(
            group = group,
            topic = topic,
            partition = partition,
            position = position,
            "Consumer opened"
        );
        Ok(PartitionConsumer::new(
            self.inner.clone(),
            group.to_string(),
            topic.to_string(),
            partition,
            position,
        ))
    }

    /// Open one consumer per partition of `topic`.
    pub fn consumers(&self, group: &str, topic: &str) -> Result<Vec<PartitionConsumer>, BusError> {
        (0..self.partitions(topic))
            .map(|p| self.consumer(group, topic, p))
            .collect()
    }

    /// Committed offset of `group` on a partition.
    #[must_use]
    pub fn committed(&self, group: &str, topic: &str, partition: u32) -> Option<u64> {
        self.inner.committed(group, topic, partition)
    }

    /// Offset the next record appended to a partition will get.
    #[must_use]
    pub fn end_offset(&self, topic: &str, partition: u32) -> u64 {
        let state = self.inner.state.read();
        state
            .topics
            .get(topic)
            .and_then(|t| t.partitions.get(partition as usize))
            .map(PartitionLog::end)
            .unwrap_or(0)
    }

    /// Offset of the oldest record still retained in a partition.
    #[must_use]
    pub fn start_offset(&self, topic: &str, partition: u32) -> u64 {
        let state = self.inner.state.read();
        state
            .topics
            .get(topic)
            .and_then(|t| t.partitions.get(partition as usize))
            .map(|log| log.base)
            .unwrap_or(0)
    }

    /// Close the broker. Pending and future polls fail with [`BusError::Closed`].
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    fn partition_for(topic: &mut Topic, key: Option<&str>) -> u32 {
        let count = topic.partitions.len() as u64;
        match key {
            Some(k) => {
                let mut hasher = DefaultHasher::new();
                k.hash(&mut hasher);
                (hasher.finish() % count) as u32
            }
            None => {
                let p = topic.next_unkeyed % count;
                topic.next_unkeyed = topic.next_unkeyed.wrapping_add(1);
                p as u32
            }
        }
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordPublisher for InMemoryBroker {
    async fn send(
        &self,
        topic: &str,
        key: Option<&str>,
        value: Vec<u8>,
    ) -> Result<RecordMetadata, BusError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            warn!(topic = topic, "Record dropped (broker closed)");
            return Err(BusError::Closed);
        }

        self.create_topic(topic, self.inner.default_partitions);
        let metadata = {
            let mut state = self.inner.state.write();
            let t = state
                .topics
                .get_mut(topic)
                .ok_or_else(|| BusError::UnknownTopic(topic.to_string()))?;
            let partition = Self::partition_for(t, key);
            let log = &mut t.partitions[partition as usize];
            let offset = log.end();
            log.records.push_back(Record {
                topic: topic.to_string(),
                partition,
                offset,
                key: key.map(str::to_string),
                value,
            });
            let dropped = log.truncate_front(self.inner.retention);
            if dropped > 0 {
                trace!(topic = topic, partition = partition, base = log.base, "Retention dropped oldest record");
            }
            RecordMetadata {
                topic: topic.to_string(),
                partition,
                offset,
            }
        };

        self.inner.records_published.fetch_add(1, Ordering::Relaxed);
        self.inner.notify.notify_waiters();
        debug!(
            topic = topic,
            partition = metadata.partition,
            offset = metadata.offset,
            "Record published"
        );
        Ok(metadata)
    }

    fn records_published(&self) -> u64 {
        self.inner.records_published.load(Ordering::Relaxed)
    }
}
