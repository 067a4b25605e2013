//! Scheduler statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

/// Scheduler counters for monitoring.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    /// Viewport settles handled.
    settles: AtomicU64,
    /// Network fetches issued.
    fetches: AtomicU64,
    /// Settles served from a recent result.
    recency_hits: AtomicU64,
    /// Completions dropped because a newer ticket existed.
    stale_discarded: AtomicU64,
}

impl SchedulerStats {
    pub(crate) fn record_settle(&self) {
        self.settles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_recency_hit(&self) {
        self.recency_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stale_discard(&self) {
        self.stale_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> SchedulerStatsSnapshot {
        SchedulerStatsSnapshot {
            settles: self.settles.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            recency_hits: self.recency_hits.load(Ordering::Relaxed),
            stale_discarded: self.stale_discarded.load(Ordering::Relaxed),
        }
    }

    /// Log current statistics at INFO.
    pub fn log_stats(&self) {
        let s = self.snapshot();
        info!(
            settles = s.settles,
            fetches = s.fetches,
            recency_hits = s.recency_hits,
            stale_discarded = s.stale_discarded,
            "Refetch scheduler stats"
        );
    }
}

/// Snapshot of scheduler statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStatsSnapshot {
    pub settles: u64,
    pub fetches: u64,
    pub recency_hits: u64,
    pub stale_discarded: u64,
}
