//! # Partition Consumer
//!
//! Defines the consuming side of the bus.

use crate::publisher::BrokerInner;
use crate::{BusError, Record};
use async_trait::async_trait;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Trait for reading one partition of a topic.
///
/// A consumer tracks its own read position. The position only becomes
/// durable for the consumer group once [`RecordConsumer::commit`] is called;
/// a consumer reopened after a crash resumes at the last commit and sees
/// uncommitted records again.
#[async_trait]
pub trait RecordConsumer: Send {
    /// Wait up to `timeout` for records at the current position.
    ///
    /// Returns at most `max_records` records and advances the position past
    /// them. An empty vector means the wait timed out.
    async fn poll(&mut self, max_records: usize, timeout: Duration)
        -> Result<Vec<Record>, BusError>;

    /// Make the current position durable for the consumer group.
    fn commit(&mut self);

    /// Offset of the next record this consumer will return.
    fn position(&self) -> u64;

    /// Human-readable `topic/partition` label for logs.
    fn label(&self) -> String;
}

/// A consumer bound to one partition of an [`crate::InMemoryBroker`] topic.
pub struct PartitionConsumer {
    inner: Arc<BrokerInner>,
    group: String,
    topic: String,
    partition: u32,
    position: u64,
}

impl PartitionConsumer {
    pub(crate) fn new(
        inner: Arc<BrokerInner>,
        group: String,
        topic: String,
        partition: u32,
        position: u64,
    ) -> Self {
        Self {
            inner,
            group,
            topic,
            partition,
            position,
        }
    }

    /// The partition this consumer reads.
    #[must_use]
    pub fn partition(&self) -> u32 {
        self.partition
    }

    /// The topic this consumer reads.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    fn take(&mut self, max_records: usize) -> Result<Vec<Record>, BusError> {
        let records = self
            .inner
            .fetch(&self.topic, self.partition, self.position, max_records)?;
        if let Some(last) = records.last() {
            self.position = last.offset + 1;
        }
        Ok(records)
    }
}

#[async_trait]
impl RecordConsumer for PartitionConsumer {
    async fn poll(
        &mut self,
        max_records: usize,
        timeout: Duration,
    ) -> Result<Vec<Record>, BusError> {
        let deadline = Instant::now() + timeout;
        let inner = Arc::clone(&self.inner);
        loop {
            // Register interest before checking so a send between the check
            // and the wait is not missed.
            let notified = inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if inner.closed.load(Ordering::SeqCst) {
                return Err(BusError::Closed);
            }
            let records = self.take(max_records)?;
            if !records.is_empty() {
                return Ok(records);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }

    fn commit(&mut self) {
        self.inner
            .commit(&self.group, &self.topic, self.partition, self.position);
        debug!(
            group = %self.group,
            topic = %self.topic,
            partition = self.partition,
            offset = self.position,
            "Offset committed"
        );
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn label(&self) -> String {
        format!("{}/{}", self.topic, self.partition)
    }
}
