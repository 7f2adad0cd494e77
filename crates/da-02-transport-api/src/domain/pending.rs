//! Caller-side table of requests awaiting their response.
//!
//! ```text
//! send()                       response listener
//!   │ register(id) → rx            │ deliver(id, payload)
//!   │ publish request              │   waiter found → rx resolves
//!   │ await rx (caller timeout)    │   unknown id   → dropped
//!   ▼                              ▼
//! ```
//!
//! Entries leave the table when delivered, cancelled by their caller, or
//! evicted after their deadline.

use crate::domain::correlation::CorrelationId;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// A response handed to the waiting caller.
#[derive(Debug)]
pub struct Reply<T> {
    pub correlation_id: CorrelationId,
    pub payload: T,
    /// Time from registration to delivery.
    pub round_trip: Duration,
}

/// Result of [`PendingRequestStore::deliver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The waiting caller received the payload.
    Delivered,
    /// No waiter under this ID (never registered, expired or delivered).
    Unknown,
    /// The waiter existed but its caller stopped listening.
    CallerGone,
}

struct Waiter<T> {
    tx: oneshot::Sender<Reply<T>>,
    registered_at: Instant,
    deadline: Instant,
    kind: &'static str,
}

/// Counters kept by the pending table.
#[derive(Debug, Default)]
pub struct PendingStats {
    pub registered: AtomicU64,
    pub delivered: AtomicU64,
    pub expired: AtomicU64,
    /// Cancelled by the caller, or delivered after the caller left.
    pub abandoned: AtomicU64,
}

impl PendingStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

pub struct PendingRequestStore<T> {
    waiters: DashMap<CorrelationId, Waiter<T>>,
    stats: PendingStats,
}

impl<T> PendingRequestStore<T> {
    pub fn new() -> Self {
        Self {
            waiters: DashMap::new(),
            stats: PendingStats::default(),
        }
    }

    /// Add a waiter that expires `timeout` from now.
    pub fn register(
        &self,
        correlation_id: CorrelationId,
        kind: &'static str,
        timeout: Duration,
    ) -> oneshot::Receiver<Reply<T>> {
        let (tx, rx) = oneshot::channel();
        let now = Instant::now();
        self.waiters.insert(
            correlation_id,
            Waiter {
                tx,
                registered_at: now,
                deadline: now + timeout,
                kind,
            },
        );
        PendingStats::bump(&self.stats.registered);
        trace!(request_id = %correlation_id, kind = kind, "Waiting for response");
        rx
    }

    /// Hand `payload` to the caller waiting on `correlation_id`.
    pub fn deliver(&self, correlation_id: CorrelationId, payload: T) -> Delivery {
        let Some((_, waiter)) = self.waiters.remove(&correlation_id) else {
            debug!(request_id = %correlation_id, "Response for unknown or expired request dropped");
            return Delivery::Unknown;
        };

        let round_trip = waiter.registered_at.elapsed();
        let reply = Reply {
            correlation_id,
            payload,
            round_trip,
        };
        if waiter.tx.send(reply).is_err() {
            PendingStats::bump(&self.stats.abandoned);
            return Delivery::CallerGone;
        }

        PendingStats::bump(&self.stats.delivered);
        trace!(
            request_id = %correlation_id,
            kind = waiter.kind,
            round_trip_ms = round_trip.as_millis(),
            "Response delivered"
        );
        Delivery::Delivered
    }

    /// Drop every waiter whose deadline is at or before `now`.
    pub fn evict_expired(&self, now: Instant) -> usize {
        let before = self.waiters.len();
        self.waiters.retain(|id, waiter| {
            let keep = waiter.deadline > now;
            if !keep {
                warn!(request_id = %id, kind = waiter.kind, "Pending request expired");
            }
            keep
        });
        let evicted = before.saturating_sub(self.waiters.len());
        self.stats.expired.fetch_add(evicted as u64, Ordering::Relaxed);
        evicted
    }

    /// Remove a waiter whose caller gave up.
    pub fn cancel(&self, correlation_id: &CorrelationId) -> bool {
        let removed = self.waiters.remove(correlation_id).is_some();
        if removed {
            PendingStats::bump(&self.stats.abandoned);
        }
        removed
    }

    pub fn contains(&self, correlation_id: &CorrelationId) -> bool {
        self.waiters.contains_key(correlation_id)
    }

    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}

impl<T> Default for PendingRequestStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Evict expired waiters every `interval`. Runs until dropped.
pub async fn run_eviction<T>(store: Arc<PendingRequestStore<T>>, interval: Duration) {
    let mut tick = tokio::time::interval(interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tick.tick().await;
        let evicted = store.evict_expired(Instant::now());
        if evicted > 0 {
            debug!(evicted = evicted, "Evicted expired pending requests");
        }
    }
}
