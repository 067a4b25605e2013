//! Bounded per-key result cache.
//!
//! Holds the merged [`ArtifactSet`] for the most recently used query keys.
//! Each entry carries an epoch that changes whenever a first page replaces
//! the set, so a later page requested against an older set can be
//! recognized and dropped instead of being mixed into the new one.

use std::collections::HashMap;

use tracing::debug;

use super::query::{Page, QueryKey};
use super::set::ArtifactSet;
use crate::artifact::ArtifactPage;

/// Default number of query keys kept.
pub const DEFAULT_MAX_CACHED_KEYS: usize = 32;

struct CacheEntry {
    set: ArtifactSet,
    epoch: u64,
    /// Value of the use counter at the last read or write.
    last_used: u64,
}

/// Least-recently-used cache of merged result sets.
pub(super) struct ResultCache {
    entries: HashMap<QueryKey, CacheEntry>,
    capacity: usize,
    next_epoch: u64,
    uses: u64,
}

impl ResultCache {
    pub(super) fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            next_epoch: 0,
            uses: 0,
        }
    }

    /// The set for `key`, marking it recently used.
    pub(super) fn get(&mut self, key: &QueryKey) -> Option<ArtifactSet> {
        let tick = self.tick();
        let entry = self.entries.get_mut(key)?;
        entry.last_used = tick;
        Some(entry.set.clone())
    }

    /// Epoch of the set currently held for `key`.
    pub(super) fn epoch(&self, key: &QueryKey) -> Option<u64> {
        self.entries.get(key).map(|e| e.epoch)
    }

    /// Store a page.
    ///
    /// A first page always replaces the set under a new epoch. A later page
    /// merges only if the set still has the epoch it was requested against
    /// (`None` meaning no set existed); otherwise it is dropped and `false`
    /// returned.
    pub(super) fn store(
        &mut self,
        key: &QueryKey,
        requested_epoch: Option<u64>,
        page: &ArtifactPage,
        at: Page,
    ) -> bool {
        if !at.is_first() && self.epoch(key) != requested_epoch {
            debug!(
                key = %key,
                skip = at.skip,
                "Dropping page from a superseded pagination run"
            );
            return false;
        }

        let tick = self.tick();
        match self.entries.get_mut(key) {
            Some(entry) if !at.is_first() => {
                entry.set.merge(page, at);
                entry.last_used = tick;
            }
            _ => {
                let epoch = self.next_epoch;
                self.next_epoch += 1;
                self.entries.insert(
                    key.clone(),
                    CacheEntry {
                        set: ArtifactSet::from_page(page, at),
                        epoch,
                        last_used: tick,
                    },
                );
                self.evict_over_capacity();
            }
        }
        true
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(super) fn clear(&mut self) {
        self.entries.clear();
    }

    fn tick(&mut self) -> u64 {
        self.uses += 1;
        self.uses
    }

    fn evict_over_capacity(&mut self) {
        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    debug!(key = %key, "Evicting cached result set");
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Artifact, ArtifactType, TypeFilter, ViewDistance};
    use crate::geo::GeoPoint;

    fn key(lat: f64) -> QueryKey {
        QueryKey::new(GeoPoint::new(lat, -122.35).unwrap(), 500, TypeFilter::all(), 4)
    }

    fn page(ids: &[u64], has_more: bool) -> ArtifactPage {
        let band = ViewDistance::new(5.0, 100.0).unwrap();
        let location = GeoPoint::new(47.62, -122.35).unwrap();
        ArtifactPage {
            artifacts: ids
                .iter()
                .map(|&id| Artifact::new(id, ArtifactType::Art, location, band))
                .collect(),
            total_count: 10,
            has_more,
            dropped: 0,
        }
    }

    fn ids(set: &ArtifactSet) -> Vec<u64> {
        set.artifacts().iter().map(|a| a.id).collect()
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let mut cache = ResultCache::new(2);
        let first = Page::first(2);

        cache.store(&key(47.0), None, &page(&[1], false), first);
        cache.store(&key(47.1), None, &page(&[2], false), first);
        assert!(cache.get(&key(47.0)).is_some());
        cache.store(&key(47.2), None, &page(&[3], false), first);

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key(47.1)).is_none(), "Oldest untouched key goes first");
        assert!(cache.get(&key(47.0)).is_some());
        assert!(cache.get(&key(47.2)).is_some());
    }

    #[test]
    fn test_many_keys_stay_bounded() {
        let mut cache = ResultCache::new(DEFAULT_MAX_CACHED_KEYS);
        for i in 0..200 {
            let k = key(40.0 + i as f64 * 0.01);
            cache.store(&k, None, &page(&[i], false), Page::first(50));
        }
        assert_eq!(cache.len(), DEFAULT_MAX_CACHED_KEYS);
    }

    #[test]
    fn test_later_page_merges_into_same_run() {
        let mut cache = ResultCache::new(4);
        let k = key(47.0);
        let first = Page::first(2);

        cache.store(&k, None, &page(&[1, 2], true), first);
        let epoch = cache.epoch(&k);
        assert!(cache.store(&k, epoch, &page(&[3, 4], false), first.next()));

        assert_eq!(ids(&cache.get(&k).unwrap()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_later_page_from_superseded_run_dropped() {
        let mut cache = ResultCache::new(4);
        let k = key(47.0);
        let first = Page::first(2);

        cache.store(&k, None, &page(&[1, 2], true), first);
        let stale_epoch = cache.epoch(&k);

        // First page refetched while page two was in flight
        cache.store(&k, None, &page(&[7, 8], true), first);
        let merged = cache.store(&k, stale_epoch, &page(&[3, 4], false), first.next());

        assert!(!merged);
        let set = cache.get(&k).unwrap();
        assert_eq!(ids(&set), vec![7, 8]);
        assert!(set.has_more());
    }

    #[test]
    fn test_later_page_after_eviction_dropped() {
        let mut cache = ResultCache::new(4);
        let k = key(47.0);

        cache.store(&k, None, &page(&[1, 2], true), Page::first(2));
        let epoch = cache.epoch(&k);
        cache.clear();

        assert!(!cache.store(&k, epoch, &page(&[3], false), Page::first(2).next()));
        assert!(cache.get(&k).is_none());
    }
}
