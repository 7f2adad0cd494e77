//! Response template counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by the response template.
#[derive(Debug, Default)]
pub struct TemplateStats {
    /// Records read off the request topic.
    pub received: AtomicU64,
    /// Requests handed to the handler.
    pub dispatched: AtomicU64,
    /// Handler results published.
    pub completed: AtomicU64,
    /// Requests answered with the default response after the timeout.
    pub timed_out: AtomicU64,
    /// Handler tasks that ended without a result.
    pub failed: AtomicU64,
    /// Records dropped before dispatch (undecodable, duplicate in flight).
    pub skipped: AtomicU64,
    /// Responses that could not be encoded or published.
    pub publish_errors: AtomicU64,
}

/// Point-in-time copy of [`TemplateStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub received: u64,
    pub dispatched: u64,
    pub completed: u64,
    pub timed_out: u64,
    pub failed: u64,
    pub skipped: u64,
    pub publish_errors: u64,
}

impl TemplateStats {
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            publish_errors: self.publish_errors.load(Ordering::Relaxed),
        }
    }
}
