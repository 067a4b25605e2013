//! In-memory artifact endpoint.
//!
//! [`ScriptedArtifactClient`] answers nearby queries from an in-memory
//! catalog the way the real endpoint does: published artifacts only,
//! filtered by type and radius, nearest first, then paginated. Tests can
//! inject failures and hold requests at a gate to control completion order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify};

use super::client::ArtifactClient;
use super::error::FetchError;
use super::query::NearbyRequest;
use crate::artifact::{Artifact, ArtifactId, ArtifactPage};
use crate::geo::{distance_meters, GeoPoint};

struct HeldRequest {
    request: NearbyRequest,
    release: oneshot::Sender<()>,
}

/// Artifact client backed by an in-memory catalog.
#[derive(Default)]
pub struct ScriptedArtifactClient {
    catalog: Mutex<Vec<Artifact>>,
    requests: Mutex<Vec<NearbyRequest>>,
    failures: Mutex<VecDeque<FetchError>>,
    held: Mutex<Vec<HeldRequest>>,
    gated: AtomicBool,
    arrivals: Notify,
}

impl ScriptedArtifactClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client serving the given catalog.
    pub fn with_catalog(artifacts: impl IntoIterator<Item = Artifact>) -> Self {
        let client = Self::new();
        client.set_catalog(artifacts);
        client
    }

    /// Replace the catalog.
    pub fn set_catalog(&self, artifacts: impl IntoIterator<Item = Artifact>) {
        *self.catalog.lock() = artifacts.into_iter().collect();
    }

    /// Fail the next request with `error` (queued, one per request).
    pub fn fail_next(&self, error: FetchError) {
        self.failures.lock().push_back(error);
    }

    /// Hold every subsequent request until released.
    pub fn hold_requests(&self, gated: bool) {
        self.gated.store(gated, Ordering::SeqCst);
    }

    /// Release held requests matching `predicate`. Returns how many.
    pub fn release_where(&self, predicate: impl Fn(&NearbyRequest) -> bool) -> usize {
        let mut held = self.held.lock();
        let mut released = 0;
        let mut i = 0;
        while i < held.len() {
            if predicate(&held[i].request) {
                let entry = held.swap_remove(i);
                let _ = entry.release.send(());
                released += 1;
            } else {
                i += 1;
            }
        }
        released
    }

    /// Release every held request.
    pub fn release_all(&self) -> usize {
        self.release_where(|_| true)
    }

    /// Number of requests currently held at the gate.
    pub fn held_count(&self) -> usize {
        self.held.lock().len()
    }

    /// Every nearby request received so far, in arrival order.
    pub fn requests(&self) -> Vec<NearbyRequest> {
        self.requests.lock().clone()
    }

    /// Number of nearby requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Wait until at least `count` nearby requests have arrived.
    pub async fn wait_for_requests(&self, count: usize) {
        loop {
            let notified = self.arrivals.notified();
            if self.request_count() >= count {
                return;
            }
            notified.await;
        }
    }

    fn record(&self, request: &NearbyRequest) -> Option<oneshot::Receiver<()>> {
        self.requests.lock().push(request.clone());
        let gate = if self.gated.load(Ordering::SeqCst) {
            let (tx, rx) = oneshot::channel();
            self.held.lock().push(HeldRequest {
                request: request.clone(),
                release: tx,
            });
            Some(rx)
        } else {
            None
        };
        self.arrivals.notify_waiters();
        gate
    }

    fn answer(&self, request: &NearbyRequest) -> Result<ArtifactPage, FetchError> {
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }

        let catalog = self.catalog.lock();
        let mut matches: Vec<(f64, &Artifact)> = catalog
            .iter()
            .filter(|a| a.is_published() && request.types.allows(a.artifact_type))
            .map(|a| (distance_meters(request.center, a.location), a))
            .filter(|(d, _)| *d <= request.radius_meters as f64)
            .collect();
        matches.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = matches.len();
        let skip = request.page.skip as usize;
        let limit = request.page.limit as usize;
        let artifacts: Vec<Artifact> = matches
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(_, a)| a.clone())
            .collect();

        Ok(ArtifactPage {
            has_more: skip + artifacts.len() < total,
            total_count: total as u64,
            artifacts,
            dropped: 0,
        })
    }
}

impl ArtifactClient for ScriptedArtifactClient {
    async fn fetch_nearby(&self, request: &NearbyRequest) -> Result<ArtifactPage, FetchError> {
        if let Some(gate) = self.record(request) {
            // A dropped sender also releases
            let _ = gate.await;
        }
        self.answer(request)
    }

    async fn fetch_artifact(
        &self,
        id: ArtifactId,
        _user: Option<GeoPoint>,
    ) -> Result<Artifact, FetchError> {
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        self.catalog
            .lock()
            .iter()
            .find(|a| a.id == id && a.is_published())
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("artifact {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactStatus, ArtifactType, TypeFilter, ViewDistance};
    use crate::geo::destination;
    use crate::repository::{NearbyQuery, Page, QueryKey};
    use std::sync::Arc;

    fn origin() -> GeoPoint {
        GeoPoint::new(47.6205, -122.3493).unwrap()
    }

    fn artifact_at(id: u64, meters_north: f64, t: ArtifactType) -> Artifact {
        Artifact::new(
            id,
            t,
            destination(origin(), 0.0, meters_north),
            ViewDistance::new(5.0, 50.0).unwrap(),
        )
    }

    fn request(radius: u32, types: TypeFilter, page: Page) -> NearbyRequest {
        NearbyQuery::new(QueryKey::new(origin(), radius, types, 4), page).to_request()
    }

    #[tokio::test]
    async fn test_filters_sorts_and_paginates() {
        let client = ScriptedArtifactClient::with_catalog([
            artifact_at(1, 300.0, ArtifactType::Art),
            artifact_at(2, 100.0, ArtifactType::Art),
            artifact_at(3, 200.0, ArtifactType::Menu),
            artifact_at(4, 5000.0, ArtifactType::Art),
            artifact_at(5, 50.0, ArtifactType::Art).with_status(ArtifactStatus::Hidden),
        ]);

        let page = client
            .fetch_nearby(&request(1000, TypeFilter::all(), Page::first(2)))
            .await
            .unwrap();
        let ids: Vec<_> = page.artifacts.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 3], "Nearest first, hidden and distant excluded");
        assert_eq!(page.total_count, 3);
        assert!(page.has_more);

        let next = client
            .fetch_nearby(&request(1000, TypeFilter::all(), Page::first(2).next()))
            .await
            .unwrap();
        assert_eq!(next.artifacts.len(), 1);
        assert!(!next.has_more);

        let art_only = client
            .fetch_nearby(&request(
                1000,
                TypeFilter::only([ArtifactType::Art]),
                Page::first(10),
            ))
            .await
            .unwrap();
        assert!(art_only
            .artifacts
            .iter()
            .all(|a| a.artifact_type == ArtifactType::Art));
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let client = ScriptedArtifactClient::new();
        client.fail_next(FetchError::Network("reset".into()));

        let req = request(1000, TypeFilter::all(), Page::default());
        assert!(client.fetch_nearby(&req).await.is_err());
        assert!(client.fetch_nearby(&req).await.is_ok());
        assert_eq!(client.request_count(), 2);
    }

    #[tokio::test]
    async fn test_gate_holds_until_released() {
        let client = Arc::new(ScriptedArtifactClient::new());
        client.hold_requests(true);

        let task = {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                let req = request(1000, TypeFilter::all(), Page::default());
                client.fetch_nearby(&req).await
            })
        };

        client.wait_for_requests(1).await;
        assert_eq!(client.held_count(), 1);
        assert!(!task.is_finished());

        assert_eq!(client.release_all(), 1);
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_fetch_artifact_by_id() {
        let client = ScriptedArtifactClient::with_catalog([artifact_at(7, 10.0, ArtifactType::Art)]);

        assert_eq!(client.fetch_artifact(7, None).await.unwrap().id, 7);
        assert!(matches!(
            client.fetch_artifact(8, None).await,
            Err(FetchError::NotFound(_))
        ));
    }
}
