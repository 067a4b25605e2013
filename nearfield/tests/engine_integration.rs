//! Integration tests for the proximity engine.
//!
//! These tests run the full event loop against the scripted in-memory
//! endpoint, holding requests at its gate to control completion order:
//! - Last request wins when settles resolve out of order
//! - Concurrent identical fetches share one outbound request
//! - Filter changes refetch once with the prior viewport
//! - Missing position, denied permission and network failures degrade
//!   to "nothing viewable" or a stale display
//!
//! Run with: `cargo test --test engine_integration`

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use nearfield::artifact::{Artifact, ArtifactType, TypeFilter, ViewDistance};
use nearfield::engine::{
    EngineConfig, EngineError, EngineHandle, EngineSnapshot, ProximityEngine,
};
use nearfield::geo::{destination, distance_meters, GeoPoint};
use nearfield::position::{PositionError, PositionSource, StaticLocationService, UserPosition};
use nearfield::repository::{
    FetchError, NearbyArtifactRepository, NearbyQuery, QueryKey, RepositoryConfig,
    ScriptedArtifactClient,
};
use nearfield::scheduler::{SchedulerConfig, SchedulerStats};
use nearfield::viewport::{Viewport, ViewportTracker};
use nearfield::visibility::Visibility;

const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Test Helpers
// ============================================================================

fn space_needle() -> GeoPoint {
    GeoPoint::new(47.6205, -122.3493).unwrap()
}

fn pike_place() -> GeoPoint {
    GeoPoint::new(47.6085, -122.3401).unwrap()
}

fn catalog() -> Vec<Artifact> {
    let band = ViewDistance::new(5.0, 100.0).unwrap();
    vec![
        Artifact::new(1, ArtifactType::Art, space_needle(), band),
        Artifact::new(2, ArtifactType::Menu, destination(space_needle(), 90.0, 60.0), band),
        Artifact::new(3, ArtifactType::InfoCard, pike_place(), band),
    ]
}

struct Harness {
    repository: NearbyArtifactRepository<ScriptedArtifactClient>,
    position: Arc<PositionSource<StaticLocationService>>,
    viewport: Arc<ViewportTracker>,
    handle: EngineHandle,
    stats: Arc<SchedulerStats>,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Harness {
    fn start(service: StaticLocationService) -> Self {
        Self::start_with(service, EngineConfig::default())
    }

    fn start_with(service: StaticLocationService, config: EngineConfig) -> Self {
        let client = ScriptedArtifactClient::with_catalog(catalog());
        let repository = NearbyArtifactRepository::new(client, RepositoryConfig::default());
        let position = Arc::new(PositionSource::new(service));
        position.check_permission();
        let viewport = Arc::new(ViewportTracker::new());

        let (engine, handle) = ProximityEngine::new(
            repository.clone(),
            Arc::clone(&position),
            Arc::clone(&viewport),
            config,
        );
        let stats = engine.scheduler_stats();
        let token = CancellationToken::new();
        let task = tokio::spawn(engine.run(token.clone()));

        Self {
            repository,
            position,
            viewport,
            handle,
            stats,
            token,
            task,
        }
    }

    fn client(&self) -> &ScriptedArtifactClient {
        self.repository.client()
    }

    fn settle(&self, center: GeoPoint) {
        self.viewport.settle_viewport(Viewport::new(center, 500));
    }

    /// Place the user `meters` east of `from`.
    fn move_user(&self, from: GeoPoint, meters: f64, step: u64) {
        let point = if meters == 0.0 {
            from
        } else {
            destination(from, 90.0, meters)
        };
        let reading = UserPosition::from_device(point, 5.0)
            .at(Instant::now() + Duration::from_millis(step));
        assert!(self.position.apply_reading(reading));
    }

    async fn wait_until(&self, mut pred: impl FnMut(&EngineSnapshot) -> bool) -> EngineSnapshot {
        let mut rx = self.handle.subscribe();
        tokio::time::timeout(WAIT, async {
            loop {
                let snapshot = rx.borrow_and_update().clone();
                if pred(&snapshot) {
                    return snapshot;
                }
                rx.changed().await.expect("engine stopped");
            }
        })
        .await
        .expect("timed out waiting for snapshot")
    }

    async fn wait_for_stale_discards(&self, count: u64) {
        tokio::time::timeout(WAIT, async {
            while self.stats.snapshot().stale_discarded < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for discard");
    }

    async fn stop(self) {
        self.token.cancel();
        self.task.await.unwrap();
    }
}

fn ids(snapshot: &EngineSnapshot) -> Vec<u64> {
    let mut ids: Vec<u64> = snapshot.artifacts.iter().map(|a| a.artifact.id).collect();
    ids.sort_unstable();
    ids
}

fn near(a: GeoPoint, b: GeoPoint) -> bool {
    distance_meters(a, b) < 50.0
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
async fn test_last_request_wins() {
    let h = Harness::start(StaticLocationService::new());
    h.client().hold_requests(true);

    h.settle(space_needle());
    h.client().wait_for_requests(1).await;
    h.settle(pike_place());
    h.client().wait_for_requests(2).await;

    // K2 resolves first
    assert_eq!(h.client().release_where(|r| near(r.center, pike_place())), 1);
    let snapshot = h.wait_until(|s| !s.loading && !s.is_empty()).await;
    assert_eq!(ids(&snapshot), vec![3]);

    // K1 resolves late and is discarded
    assert_eq!(h.client().release_all(), 1);
    h.wait_for_stale_discards(1).await;

    let snapshot = h.handle.snapshot();
    assert_eq!(ids(&snapshot), vec![3], "Display must reflect the last settle");
    assert!(near(snapshot.query.unwrap().center(), pike_place()));
    assert!(!snapshot.stale);

    h.stop().await;
}

#[tokio::test]
async fn test_concurrent_identical_fetches_share_request() {
    let client = ScriptedArtifactClient::with_catalog(catalog());
    client.hold_requests(true);
    let repository = NearbyArtifactRepository::new(client, RepositoryConfig::default());
    let key = QueryKey::new(space_needle(), 500, TypeFilter::all(), 4);
    let query = NearbyQuery::first_page(key, 50);

    let first = tokio::spawn({
        let repository = repository.clone();
        let query = query.clone();
        async move { repository.fetch(&query).await }
    });
    let second = tokio::spawn({
        let repository = repository.clone();
        let query = query.clone();
        async move { repository.fetch(&query).await }
    });

    repository.client().wait_for_requests(1).await;
    // Give the second caller time to attach
    tokio::time::sleep(Duration::from_millis(50)).await;
    repository.client().release_all();

    let a = first.await.unwrap().unwrap();
    let b = second.await.unwrap().unwrap();

    assert!(Arc::ptr_eq(&a, &b), "Both callers observe the same value");
    assert_eq!(repository.client().request_count(), 1);
    assert_eq!(repository.stats().network_requests, 1);
}

// ============================================================================
// Filters
// ============================================================================

#[tokio::test]
async fn test_filter_change_refetches_once_with_prior_viewport() {
    let h = Harness::start(StaticLocationService::new());

    h.settle(space_needle());
    let before = h.wait_until(|s| s.query.is_some()).await;
    assert_eq!(ids(&before), vec![1, 2]);
    assert_eq!(h.client().request_count(), 1);

    let menu = TypeFilter::only([ArtifactType::Menu]);
    h.handle.set_filter(menu.clone()).await.unwrap();
    let after = h
        .wait_until(|s| s.query.as_ref().is_some_and(|q| q.types() == &menu))
        .await;

    assert_eq!(ids(&after), vec![2]);
    let requests = h.client().requests();
    assert_eq!(requests.len(), 2, "Exactly one refetch");
    assert_eq!(requests[1].center, requests[0].center);
    assert_eq!(requests[1].radius_meters, requests[0].radius_meters);
    assert_eq!(requests[1].types, menu);

    // Same filter again is a no-op
    h.handle.set_filter(menu).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.client().request_count(), 2);

    h.stop().await;
}

#[tokio::test]
async fn test_filter_narrows_display_before_refetch() {
    let h = Harness::start(StaticLocationService::new());
    h.settle(space_needle());
    h.wait_until(|s| s.len() == 2).await;

    h.client().hold_requests(true);
    h.handle
        .set_filter(TypeFilter::only([ArtifactType::Art]))
        .await
        .unwrap();

    let narrowed = h.wait_until(|s| s.loading).await;
    assert_eq!(ids(&narrowed), vec![1]);

    h.client().hold_requests(false);
    h.client().release_all();
    h.stop().await;
}

// ============================================================================
// Position
// ============================================================================

#[tokio::test]
async fn test_no_position_everything_hidden() {
    let h = Harness::start(StaticLocationService::new());

    h.settle(space_needle());
    let snapshot = h.wait_until(|s| !s.is_empty()).await;

    for entry in snapshot.artifacts.iter() {
        assert_eq!(entry.state.distance_meters, None);
        assert!(!entry.state.is_in_range);
    }
    assert!(!h.handle.can_enter_ar(1));

    h.stop().await;
}

#[tokio::test]
async fn test_position_updates_gate_without_refetch() {
    let h = Harness::start(StaticLocationService::new());
    h.settle(space_needle());
    h.wait_until(|s| !s.is_empty()).await;

    h.move_user(space_needle(), 40.0, 1);
    h.wait_until(|s| s.can_enter_ar(1)).await;
    assert!(h.handle.can_enter_ar(1));

    h.move_user(space_needle(), 0.0, 2);
    let snapshot = h
        .wait_until(|s| s.get(1).is_some_and(|a| a.visibility() == Visibility::Locked))
        .await;
    assert!(!snapshot.can_enter_ar(1));

    assert_eq!(h.client().request_count(), 1, "Position alone never refetches");
    h.stop().await;
}

#[tokio::test]
async fn test_permission_denied_reported() {
    let h = Harness::start(StaticLocationService::denied());

    let snapshot = h.wait_until(|s| s.last_error.is_some()).await;

    assert_eq!(
        snapshot.last_error,
        Some(EngineError::Position(PositionError::PermissionDenied))
    );
    assert!(snapshot.position.is_none());
    h.stop().await;
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_network_failure_keeps_last_good_set() {
    let h = Harness::start(StaticLocationService::new());
    h.settle(space_needle());
    let good = h.wait_until(|s| s.query.is_some()).await;

    h.client()
        .fail_next(FetchError::Network("connection reset".to_string()));
    h.settle(pike_place());
    let failed = h.wait_until(|s| s.stale).await;

    assert_eq!(ids(&failed), ids(&good));
    assert_eq!(failed.query, good.query);
    assert!(matches!(
        failed.last_error,
        Some(EngineError::Fetch(FetchError::Network(_)))
    ));

    // The next successful settle clears the stale flag
    h.settle(pike_place());
    let recovered = h.wait_until(|s| !s.stale && !s.loading).await;
    assert_eq!(ids(&recovered), vec![3]);
    assert!(recovered.last_error.is_none());

    h.stop().await;
}

#[tokio::test]
async fn test_auth_error_propagated_verbatim() {
    let h = Harness::start(StaticLocationService::new());
    h.client()
        .fail_next(FetchError::AuthRequired("Not authenticated".to_string()));

    h.settle(space_needle());
    let snapshot = h.wait_until(|s| s.last_error.is_some()).await;

    assert_eq!(
        snapshot.last_error,
        Some(EngineError::Fetch(FetchError::AuthRequired(
            "Not authenticated".to_string()
        )))
    );
    h.stop().await;
}

#[tokio::test]
async fn test_invalid_viewport_issues_no_fetch() {
    let h = Harness::start(StaticLocationService::new());

    h.viewport
        .settle_viewport(Viewport::new(space_needle(), 50_000));
    let snapshot = h.wait_until(|s| s.last_error.is_some()).await;

    assert!(matches!(
        snapshot.last_error,
        Some(EngineError::Fetch(FetchError::InvalidQuery(_)))
    ));
    assert_eq!(h.client().request_count(), 0);
    h.stop().await;
}

#[tokio::test]
async fn test_filter_change_after_rejected_settle_refetches() {
    let h = Harness::start(StaticLocationService::new());

    h.settle(space_needle());
    let snapshot = h.wait_until(|s| !s.loading && !s.is_empty()).await;
    assert_eq!(ids(&snapshot), vec![1, 2]);

    h.viewport
        .settle_viewport(Viewport::new(space_needle(), 50_000));
    h.wait_until(|s| s.last_error.is_some()).await;

    let menu = TypeFilter::only([ArtifactType::Menu]);
    h.handle.set_filter(menu.clone()).await.unwrap();
    h.client().wait_for_requests(2).await;
    let snapshot = h
        .wait_until(|s| !s.loading && s.query.as_ref().is_some_and(|q| q.types() == &menu))
        .await;
    assert_eq!(ids(&snapshot), vec![2]);

    // Widening again must go back to the network
    h.handle.set_filter(TypeFilter::all()).await.unwrap();
    h.client().wait_for_requests(3).await;
    let snapshot = h
        .wait_until(|s| !s.loading && s.query.as_ref().is_some_and(|q| q.types().is_all()))
        .await;
    assert_eq!(ids(&snapshot), vec![1, 2]);

    let requests = h.client().requests();
    assert!(requests.iter().all(|r| r.radius_meters == 500));
    h.stop().await;
}

#[tokio::test]
async fn test_recent_key_refetches_after_cache_cleared() {
    let config = EngineConfig {
        scheduler: SchedulerConfig {
            recency_window: Duration::from_secs(60),
            ..SchedulerConfig::default()
        },
        ..EngineConfig::default()
    };
    let h = Harness::start_with(StaticLocationService::new(), config);
    let at = |point: GeoPoint| {
        move |s: &EngineSnapshot| {
            !s.loading && s.query.as_ref().is_some_and(|q| near(q.center(), point))
        }
    };

    h.settle(space_needle());
    h.wait_until(at(space_needle())).await;
    h.settle(pike_place());
    h.wait_until(at(pike_place())).await;

    // Inside the window: served from the cache
    h.settle(space_needle());
    let snapshot = h.wait_until(at(space_needle())).await;
    assert_eq!(ids(&snapshot), vec![1, 2]);
    assert_eq!(h.client().request_count(), 2);
    assert_eq!(h.stats.snapshot().recency_hits, 1);

    h.settle(pike_place());
    h.wait_until(at(pike_place())).await;
    h.repository.clear_cache();

    h.settle(space_needle());
    h.client().wait_for_requests(3).await;
    let snapshot = h.wait_until(at(space_needle())).await;
    assert_eq!(ids(&snapshot), vec![1, 2]);
    h.stop().await;
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_shutdown_stops_engine() {
    let h = Harness::start(StaticLocationService::new());

    h.handle.shutdown().await.unwrap();
    tokio::time::timeout(WAIT, h.task).await.unwrap().unwrap();

    let result = h.handle.set_filter(TypeFilter::all()).await;
    assert_eq!(result, Err(EngineError::Stopped));
    assert!(h.handle.is_stopped());
}
