//! Nearby artifact repository.
//!
//! Fetches artifacts near a point through an [`ArtifactClient`], coalescing
//! equivalent concurrent requests and caching the merged result set per
//! query key.
//!
//! # Usage
//!
//! ```ignore
//! let repository = NearbyArtifactRepository::new(client, RepositoryConfig::default());
//!
//! let key = QueryKey::new(center, 1000, TypeFilter::all(), 4);
//! let page = repository.fetch(&NearbyQuery::first_page(key.clone(), 50)).await?;
//!
//! while repository.cached(&key).is_some_and(|s| s.has_more()) {
//!     repository.fetch_next_page(&key).await?;
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::cache::{ResultCache, DEFAULT_MAX_CACHED_KEYS};
use super::client::ArtifactClient;
use super::coalesce::{
    CoalescerStatsSnapshot, InFlightRegistry, LeaderGuard, Registration, RequestKey, SlotState,
};
use super::error::FetchError;
use super::query::{NearbyQuery, Page, QueryKey, DEFAULT_PAGE_LIMIT};
use super::set::ArtifactSet;
use crate::artifact::{Artifact, ArtifactId, ArtifactPage};
use crate::geo::GeoPoint;

/// Repository configuration.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// How long a successful result may answer an identical request
    /// without a network call. Zero disables reuse.
    pub reuse_window: Duration,

    /// Page size used by `fetch_next_page` when nothing was fetched yet.
    pub page_limit: u32,

    /// Query keys whose merged sets are kept; the least recently used
    /// key is evicted beyond this.
    pub max_cached_keys: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            reuse_window: Duration::ZERO,
            page_limit: DEFAULT_PAGE_LIMIT,
            max_cached_keys: DEFAULT_MAX_CACHED_KEYS,
        }
    }
}

struct RepositoryInner<C> {
    client: C,
    registry: Arc<InFlightRegistry>,
    cache: Mutex<ResultCache>,
    config: RepositoryConfig,
}

/// Deduplicating, caching front for an [`ArtifactClient`].
///
/// Cheap to clone; clones share the registry and cache.
pub struct NearbyArtifactRepository<C> {
    inner: Arc<RepositoryInner<C>>,
}

impl<C> Clone for NearbyArtifactRepository<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: ArtifactClient> NearbyArtifactRepository<C> {
    pub fn new(client: C, config: RepositoryConfig) -> Self {
        Self {
            inner: Arc::new(RepositoryInner {
                client,
                registry: Arc::new(InFlightRegistry::new(config.reuse_window)),
                cache: Mutex::new(ResultCache::new(config.max_cached_keys)),
                config,
            }),
        }
    }

    /// The underlying client.
    pub fn client(&self) -> &C {
        &self.inner.client
    }

    /// Fetch one page of artifacts.
    ///
    /// Invalid queries fail with `InvalidQuery` before any network call.
    /// If an equivalent request is already in flight, this call attaches to
    /// it and receives the same outcome. Requests for other keys are never
    /// cancelled.
    pub async fn fetch(&self, query: &NearbyQuery) -> Result<Arc<ArtifactPage>, FetchError> {
        query.validate()?;

        let request_key: RequestKey = (query.key.clone(), query.page);
        let mut rx = match self.inner.registry.register(&request_key) {
            Registration::Reused(page) => return Ok(page),
            Registration::Follower(rx) => rx,
            Registration::Leader(rx) => {
                self.spawn_request(request_key, query);
                rx
            }
        };

        match rx.recv().await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Network("in-flight request dropped".to_string())),
        }
    }

    /// Fetch the page after those already merged for `key`.
    ///
    /// Returns the merged set. If the server reported no further page the
    /// cached set is returned unchanged.
    pub async fn fetch_next_page(&self, key: &QueryKey) -> Result<ArtifactSet, FetchError> {
        let next = match self.cached(key) {
            Some(set) => match set.next_page() {
                Some(page) => page,
                None => return Ok(set),
            },
            None => Page::first(self.inner.config.page_limit),
        };

        self.fetch(&NearbyQuery::new(key.clone(), next)).await?;
        Ok(self.cached(key).unwrap_or_default())
    }

    /// Look up a single artifact. Not coalesced or cached.
    pub async fn fetch_artifact(
        &self,
        id: ArtifactId,
        user: Option<GeoPoint>,
    ) -> Result<Artifact, FetchError> {
        debug!(artifact_id = id, "Fetching artifact");
        self.inner.client.fetch_artifact(id, user).await
    }

    /// The merged set cached for `key`.
    pub fn cached(&self, key: &QueryKey) -> Option<ArtifactSet> {
        self.inner.cache.lock().get(key)
    }

    /// Number of query keys with a cached set.
    pub fn cached_key_count(&self) -> usize {
        self.inner.cache.lock().len()
    }

    /// Registry state for a query.
    pub fn slot_state(&self, query: &NearbyQuery) -> SlotState {
        self.inner
            .registry
            .state(&(query.key.clone(), query.page))
    }

    /// Drop every cached set.
    pub fn clear_cache(&self) {
        self.inner.cache.lock().clear();
    }

    pub fn stats(&self) -> CoalescerStatsSnapshot {
        self.inner.registry.stats()
    }

    pub fn log_stats(&self) {
        self.inner.registry.log_stats();
    }

    fn spawn_request(&self, request_key: RequestKey, query: &NearbyQuery) {
        let inner = Arc::clone(&self.inner);
        let request = query.to_request();
        // Later pages belong to the set as it is now
        let epoch = if request_key.1.is_first() {
            None
        } else {
            inner.cache.lock().epoch(&request_key.0)
        };
        let guard = LeaderGuard::new(Arc::clone(&inner.registry), request_key);

        tokio::spawn(async move {
            let outcome = inner.client.fetch_nearby(&request).await.map(Arc::new);
            let (key, page) = guard.key().clone();

            match &outcome {
                Ok(result) => {
                    inner.cache.lock().store(&key, epoch, result, page);
                    debug!(
                        key = %key,
                        skip = page.skip,
                        received = result.artifacts.len(),
                        dropped = result.dropped,
                        has_more = result.has_more,
                        "Nearby query completed"
                    );
                }
                Err(e) => warn!(key = %key, skip = page.skip, error = %e, "Nearby query failed"),
            }

            guard.complete(outcome);
        });
    }
}
