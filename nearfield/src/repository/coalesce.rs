//! In-flight request registry for the nearby query.
//!
//! Prevents duplicate outbound queries: when several callers ask for the
//! same `(QueryKey, Page)` at once, only one network request runs and every
//! caller receives the same result or the same failure.
//!
//! # Architecture
//!
//! ```text
//! fetch(K) ─┐
//!           │                              ArtifactClient
//! fetch(K) ─┼──► InFlightRegistry ──────► (one request)
//!           │        │                           │
//! fetch(K) ─┘        ▼                           ▼
//!              [all three receive ◄──── complete(K, outcome)
//!               the same outcome]
//! ```
//!
//! # Slot states
//!
//! Each key is in exactly one state: `Idle` (no entry), `Pending` (a leader
//! is fetching; followers subscribe to its broadcast), `Resolved` (the last
//! success, reusable inside the reuse window) or `Failed` (the last
//! failure, kept until the key is requested again or expires).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::error::FetchError;
use super::query::{Page, QueryKey};
use crate::artifact::ArtifactPage;

/// Registry key: pagination is part of the request identity.
pub type RequestKey = (QueryKey, Page);

/// The shared outcome every attached caller receives.
pub type FetchOutcome = Result<Arc<ArtifactPage>, FetchError>;

/// State of one request key.
#[derive(Debug, Clone)]
pub enum SlotState {
    Idle,
    Pending { waiters: usize },
    Resolved { page: Arc<ArtifactPage>, at: Instant },
    Failed { error: FetchError, at: Instant },
}

enum Slot {
    Pending(broadcast::Sender<FetchOutcome>),
    Resolved(Arc<ArtifactPage>, Instant),
    Failed(FetchError, Instant),
}

/// Result of registering interest in a key.
pub enum Registration {
    /// No request in flight: the caller must fetch and call `complete`.
    Leader(broadcast::Receiver<FetchOutcome>),
    /// A request is already in flight: wait on this receiver.
    Follower(broadcast::Receiver<FetchOutcome>),
    /// A recent success answered without a request.
    Reused(Arc<ArtifactPage>),
}

impl Registration {
    pub fn is_leader(&self) -> bool {
        matches!(self, Self::Leader(_))
    }
}

/// Statistics for monitoring coalescing effectiveness.
#[derive(Debug, Default)]
pub struct CoalescerStats {
    total_requests: AtomicU64,
    coalesced_requests: AtomicU64,
    network_requests: AtomicU64,
    reused_requests: AtomicU64,
}

/// Point-in-time copy of [`CoalescerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoalescerStatsSnapshot {
    /// Total registrations
    pub total_requests: u64,
    /// Registrations that attached to an in-flight request
    pub coalesced_requests: u64,
    /// Registrations that triggered a network request
    pub network_requests: u64,
    /// Registrations answered from a recent result
    pub reused_requests: u64,
}

impl CoalescerStatsSnapshot {
    /// Returns the coalescing ratio (0.0 to 1.0)
    pub fn coalescing_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.coalesced_requests as f64 / self.total_requests as f64
        }
    }
}

impl CoalescerStats {
    pub fn snapshot(&self) -> CoalescerStatsSnapshot {
        CoalescerStatsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            coalesced_requests: self.coalesced_requests.load(Ordering::Relaxed),
            network_requests: self.network_requests.load(Ordering::Relaxed),
            reused_requests: self.reused_requests.load(Ordering::Relaxed),
        }
    }
}

/// Tracks in-flight and recently finished requests per key.
///
/// The lock is never held across an await.
pub struct InFlightRegistry {
    slots: Mutex<HashMap<RequestKey, Slot>>,
    reuse_window: Duration,
    stats: CoalescerStats,
}

impl InFlightRegistry {
    /// Create a registry. A zero `reuse_window` disables reuse.
    pub fn new(reuse_window: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            reuse_window,
            stats: CoalescerStats::default(),
        }
    }

    /// Register interest in a key.
    pub fn register(&self, key: &RequestKey) -> Registration {
        let mut slots = self.slots.lock();
        self.stats.total_requests.fetch_add(1, Ordering::Relaxed);
        self.prune_expired(&mut slots);

        match slots.get(key) {
            Some(Slot::Pending(tx)) => {
                let rx = tx.subscribe();
                let coalesced = self.stats.coalesced_requests.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(
                    key = %key.0,
                    skip = key.1.skip,
                    waiters = tx.receiver_count(),
                    coalesced,
                    "Coalescing request - waiting for in-flight query"
                );
                return Registration::Follower(rx);
            }
            Some(Slot::Resolved(page, at)) if self.is_reusable(*at) => {
                self.stats.reused_requests.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key.0, skip = key.1.skip, "Reusing recent result");
                return Registration::Reused(Arc::clone(page));
            }
            _ => {}
        }

        // Capacity 1: exactly one outcome is ever sent
        let (tx, rx) = broadcast::channel(1);
        slots.insert(key.clone(), Slot::Pending(tx));
        self.stats.network_requests.fetch_add(1, Ordering::Relaxed);
        debug!(
            key = %key.0,
            skip = key.1.skip,
            in_flight_count = slots.len(),
            "New request - starting query"
        );
        Registration::Leader(rx)
    }

    /// Complete a key, broadcasting the outcome to every attached caller.
    pub fn complete(&self, key: &RequestKey, outcome: FetchOutcome) {
        let mut slots = self.slots.lock();
        let now = Instant::now();

        let next = match &outcome {
            Ok(page) if !self.reuse_window.is_zero() => Some(Slot::Resolved(Arc::clone(page), now)),
            Ok(_) => None,
            Err(e) => Some(Slot::Failed(e.clone(), now)),
        };
        let previous = match next {
            Some(slot) => slots.insert(key.clone(), slot),
            None => slots.remove(key),
        };

        if let Some(Slot::Pending(tx)) = previous {
            let waiters = tx.receiver_count();
            // Receivers may have been dropped
            let _ = tx.send(outcome);
            debug!(key = %key.0, skip = key.1.skip, waiters, "Broadcast query outcome");
        }
    }

    /// Current state of a key.
    pub fn state(&self, key: &RequestKey) -> SlotState {
        match self.slots.lock().get(key) {
            None => SlotState::Idle,
            Some(Slot::Pending(tx)) => SlotState::Pending {
                waiters: tx.receiver_count(),
            },
            Some(Slot::Resolved(page, at)) => SlotState::Resolved {
                page: Arc::clone(page),
                at: *at,
            },
            Some(Slot::Failed(error, at)) => SlotState::Failed {
                error: error.clone(),
                at: *at,
            },
        }
    }

    /// Number of requests currently in flight.
    pub fn in_flight_count(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|s| matches!(s, Slot::Pending(_)))
            .count()
    }

    pub fn stats(&self) -> CoalescerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Logs current statistics.
    pub fn log_stats(&self) {
        let stats = self.stats.snapshot();
        info!(
            total_requests = stats.total_requests,
            coalesced = stats.coalesced_requests,
            network = stats.network_requests,
            reused = stats.reused_requests,
            in_flight = self.in_flight_count(),
            coalescing_ratio = format!("{:.1}%", stats.coalescing_ratio() * 100.0),
            "Request coalescing statistics"
        );
    }

    fn is_reusable(&self, at: Instant) -> bool {
        at.elapsed() < self.reuse_window
    }

    fn prune_expired(&self, slots: &mut HashMap<RequestKey, Slot>) {
        slots.retain(|_, slot| match slot {
            Slot::Pending(_) => true,
            Slot::Resolved(_, at) | Slot::Failed(_, at) => at.elapsed() < self.reuse_window,
        });
    }
}

/// Completes a leader's key exactly once.
///
/// If the leader is dropped without completing (task panic or abort), the
/// key is failed so followers are never left waiting.
pub struct LeaderGuard {
    registry: Arc<InFlightRegistry>,
    key: RequestKey,
    completed: bool,
}

impl LeaderGuard {
    pub fn new(registry: Arc<InFlightRegistry>, key: RequestKey) -> Self {
        Self {
            registry,
            key,
            completed: false,
        }
    }

    pub fn key(&self) -> &RequestKey {
        &self.key
    }

    pub fn complete(mut self, outcome: FetchOutcome) {
        self.registry.complete(&self.key, outcome);
        self.completed = true;
    }
}

impl Drop for LeaderGuard {
    fn drop(&mut self) {
        if !self.completed {
            self.registry.complete(
                &self.key,
                Err(FetchError::Network("request abandoned".to_string())),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::TypeFilter;
    use crate::geo::GeoPoint;

    fn key(lat: f64) -> RequestKey {
        (
            QueryKey::new(
                GeoPoint::new(lat, -122.3493).unwrap(),
                1000,
                TypeFilter::all(),
                4,
            ),
            Page::default(),
        )
    }

    fn page() -> Arc<ArtifactPage> {
        Arc::new(ArtifactPage {
            total_count: 3,
            ..Default::default()
        })
    }

    #[test]
    fn test_first_request_leads() {
        let registry = InFlightRegistry::new(Duration::ZERO);
        assert!(registry.register(&key(47.62)).is_leader());
        assert!(matches!(
            registry.state(&key(47.62)),
            SlotState::Pending { .. }
        ));
    }

    #[test]
    fn test_second_request_follows() {
        let registry = InFlightRegistry::new(Duration::ZERO);
        let _leader = registry.register(&key(47.62));

        let second = registry.register(&key(47.62));

        assert!(matches!(second, Registration::Follower(_)));
        let stats = registry.stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.coalesced_requests, 1);
        assert_eq!(stats.network_requests, 1);
        assert!((stats.coalescing_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_different_keys_not_coalesced() {
        let registry = InFlightRegistry::new(Duration::ZERO);
        assert!(registry.register(&key(47.62)).is_leader());
        assert!(registry.register(&key(47.63)).is_leader());
        assert_eq!(registry.in_flight_count(), 2);
    }

    #[test]
    fn test_pages_are_distinct_requests() {
        let registry = InFlightRegistry::new(Duration::ZERO);
        let (q, p) = key(47.62);
        assert!(registry.register(&(q.clone(), p)).is_leader());
        assert!(registry.register(&(q, p.next())).is_leader());
    }

    #[tokio::test]
    async fn test_all_waiters_receive_same_outcome() {
        let registry = InFlightRegistry::new(Duration::ZERO);
        let Registration::Leader(mut leader_rx) = registry.register(&key(47.62)) else {
            panic!("Expected leader");
        };
        let Registration::Follower(mut follower_rx) = registry.register(&key(47.62)) else {
            panic!("Expected follower");
        };

        let result = page();
        registry.complete(&key(47.62), Ok(Arc::clone(&result)));

        let a = leader_rx.recv().await.unwrap().unwrap();
        let b = follower_rx.recv().await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &result));
        assert!(Arc::ptr_eq(&b, &result));
        assert!(matches!(registry.state(&key(47.62)), SlotState::Idle));
    }

    #[tokio::test]
    async fn test_failure_delivered_to_followers() {
        let registry = InFlightRegistry::new(Duration::ZERO);
        let _leader = registry.register(&key(47.62));
        let Registration::Follower(mut rx) = registry.register(&key(47.62)) else {
            panic!("Expected follower");
        };

        registry.complete(&key(47.62), Err(FetchError::Network("reset".into())));

        assert_eq!(
            rx.recv().await.unwrap().unwrap_err(),
            FetchError::Network("reset".into())
        );
    }

    #[test]
    fn test_failed_slot_does_not_block_retry() {
        let registry = InFlightRegistry::new(Duration::ZERO);
        let _leader = registry.register(&key(47.62));
        registry.complete(&key(47.62), Err(FetchError::Network("reset".into())));

        assert!(registry.register(&key(47.62)).is_leader());
    }

    #[test]
    fn test_reuse_window_answers_without_request() {
        let registry = InFlightRegistry::new(Duration::from_secs(60));
        let _leader = registry.register(&key(47.62));
        registry.complete(&key(47.62), Ok(page()));

        assert!(matches!(
            registry.state(&key(47.62)),
            SlotState::Resolved { .. }
        ));
        assert!(matches!(
            registry.register(&key(47.62)),
            Registration::Reused(_)
        ));
        assert_eq!(registry.stats().reused_requests, 1);
    }

    #[test]
    fn test_zero_window_never_reuses() {
        let registry = InFlightRegistry::new(Duration::ZERO);
        let _leader = registry.register(&key(47.62));
        registry.complete(&key(47.62), Ok(page()));

        assert!(registry.register(&key(47.62)).is_leader());
    }

    #[tokio::test]
    async fn test_dropped_guard_fails_waiters() {
        let registry = Arc::new(InFlightRegistry::new(Duration::ZERO));
        let Registration::Leader(mut rx) = registry.register(&key(47.62)) else {
            panic!("Expected leader");
        };

        drop(LeaderGuard::new(Arc::clone(&registry), key(47.62)));

        assert!(matches!(
            rx.recv().await.unwrap(),
            Err(FetchError::Network(_))
        ));
    }
}
