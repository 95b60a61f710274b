//! Coordinator counters
//!
//! Counters are relaxed atomics: they are observability data, not
//! synchronization. A snapshot may be momentarily inconsistent across
//! fields while transactions are in flight.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters owned by a coordinator
#[derive(Debug, Default)]
pub struct CoordinatorMetrics {
    started: AtomicU64,
    joined: AtomicU64,
    committed: AtomicU64,
    aborted: AtomicU64,
    abort_skipped: AtomicU64,
    ended: AtomicU64,
}

impl CoordinatorMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_start(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_join(&self) {
        self.joined.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit(&self) {
        self.committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abort(&self) {
        self.aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abort_skipped(&self) {
        self.abort_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_end(&self) {
        self.ended.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> TransactionMetrics {
        let started = self.started.load(Ordering::Relaxed);
        let committed = self.committed.load(Ordering::Relaxed);
        let aborted = self.aborted.load(Ordering::Relaxed);
        let abort_skipped = self.abort_skipped.load(Ordering::Relaxed);
        let ended = self.ended.load(Ordering::Relaxed);
        let finished = committed + aborted + abort_skipped;

        TransactionMetrics {
            total_started: started,
            total_joined: self.joined.load(Ordering::Relaxed),
            total_committed: committed,
            total_aborted: aborted,
            total_abort_skipped: abort_skipped,
            total_ended: ended,
            active_count: started.saturating_sub(ended),
            commit_rate: if finished == 0 {
                0.0
            } else {
                committed as f64 / finished as f64
            },
        }
    }
}

/// Snapshot of coordinator counters
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionMetrics {
    /// Sessions started by an owning invocation
    pub total_started: u64,
    /// Invocations that joined an existing session
    pub total_joined: u64,
    /// Transactions committed
    pub total_committed: u64,
    /// Transactions explicitly aborted
    pub total_aborted: u64,
    /// Failures left un-aborted because the server reported them
    pub total_abort_skipped: u64,
    /// Sessions ended
    pub total_ended: u64,
    /// Sessions started but not yet ended
    pub active_count: u64,
    /// Committed / (committed + aborted + abort-skipped), 0.0 if none finished
    pub commit_rate: f64,
}
