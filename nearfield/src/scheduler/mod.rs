//! Refetch scheduling.
//!
//! The [`RefetchScheduler`] decides when viewport and filter changes warrant
//! a new nearby fetch, and which completions may be adopted.
//!
//! # Rules
//!
//! - A viewport settle fetches the canonical key of the new viewport, unless
//!   that key succeeded within the recency window
//! - A filter change refetches once with the last known viewport
//! - A position update never refetches
//! - Every issued fetch carries a ticket; only the latest ticket's
//!   completion is adopted ("last request wins")
//!
//! The scheduler performs no I/O. The engine acts on its decisions.

mod stats;
mod ticket;

pub use stats::{SchedulerStats, SchedulerStatsSnapshot};
pub use ticket::{FetchTicket, RefetchDecision, SkipReason};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::artifact::TypeFilter;
use crate::repository::{
    FetchError, NearbyQuery, QueryKey, DEFAULT_CENTER_PRECISION, DEFAULT_PAGE_LIMIT,
};
use crate::viewport::Viewport;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// A key fetched successfully within this window is served from the
    /// repository cache on the next settle. Zero means every settle fetches.
    pub recency_window: Duration,

    /// Decimal places kept when keying a viewport center.
    pub center_precision: u8,

    /// Page size of the first page requested per settle.
    pub page_limit: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            recency_window: Duration::ZERO,
            center_precision: DEFAULT_CENTER_PRECISION,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Decides when to fetch and which results to keep.
pub struct RefetchScheduler {
    config: SchedulerConfig,
    /// Last settled viewport.
    viewport: Option<Viewport>,
    /// Active type filter.
    filter: TypeFilter,
    /// Generation of the most recently issued ticket (0 = none yet).
    generation: u64,
    /// Key of the last adopted completion.
    current_key: Option<QueryKey>,
    /// Successful fetch times, for the recency window.
    recent: HashMap<QueryKey, Instant>,
    stats: Arc<SchedulerStats>,
}

impl RefetchScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            viewport: None,
            filter: TypeFilter::all(),
            generation: 0,
            current_key: None,
            recent: HashMap::new(),
            stats: Arc::new(SchedulerStats::default()),
        }
    }

    /// Start from a non-default filter.
    pub fn with_filter(mut self, filter: TypeFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn filter(&self) -> &TypeFilter {
        &self.filter
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Generation of the latest issued ticket.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Key of the most recently adopted result.
    pub fn current_key(&self) -> Option<&QueryKey> {
        self.current_key.as_ref()
    }

    /// Whether `ticket` is the most recently issued one.
    pub fn is_latest(&self, ticket: &FetchTicket) -> bool {
        ticket.generation() == self.generation
    }

    /// Handle a viewport settle.
    ///
    /// Fails with `InvalidQuery` when the viewport cannot be queried (for
    /// example a radius beyond the endpoint's limit); no ticket is issued
    /// in that case, earlier tickets stay current and the last queryable
    /// viewport is kept for later filter changes.
    pub fn viewport_settled(&mut self, viewport: Viewport) -> Result<RefetchDecision, FetchError> {
        self.stats.record_settle();

        let key = self.key_for(&viewport, &self.filter);
        key.validate()?;
        self.viewport = Some(viewport);

        if self.recently_fetched(&key) {
            self.stats.record_recency_hit();
            let ticket = self.issue(key).into_cached();
            debug!(
                generation = ticket.generation(),
                key = %ticket.key(),
                "Settle served from recent result"
            );
            return Ok(RefetchDecision::UseCached(ticket));
        }

        Ok(RefetchDecision::Fetch(self.issue_fetch(key)))
    }

    /// Handle a type-filter change.
    ///
    /// Refetches once with the last known viewport, bypassing the recency
    /// window. Setting the same filter again is a no-op. A rejected change
    /// leaves the previous filter active.
    pub fn filter_changed(&mut self, filter: TypeFilter) -> Result<RefetchDecision, FetchError> {
        if filter == self.filter {
            trace!(filter = %filter, "Filter unchanged");
            return Ok(RefetchDecision::Skip(SkipReason::FilterUnchanged));
        }

        let Some(viewport) = self.viewport else {
            debug!(filter = %filter, "Filter changed before any viewport");
            self.filter = filter;
            return Ok(RefetchDecision::Skip(SkipReason::NoViewport));
        };

        let key = self.key_for(&viewport, &filter);
        key.validate()?;
        self.filter = filter;
        Ok(RefetchDecision::Fetch(self.issue_fetch(key)))
    }

    /// Handle a position update. Position alone never refetches.
    pub fn position_updated(&self) -> RefetchDecision {
        RefetchDecision::Skip(SkipReason::PositionOnly)
    }

    /// Decide whether a finished request may be adopted.
    ///
    /// Returns `true` only for the latest ticket. A successful latest
    /// completion becomes the current key; only a network completion starts
    /// its recency window, so adopting a cached set never extends it.
    pub fn accept_completion(&mut self, ticket: &FetchTicket, succeeded: bool) -> bool {
        if !self.is_latest(ticket) {
            self.stats.record_stale_discard();
            debug!(
                generation = ticket.generation(),
                latest = self.generation,
                key = %ticket.key(),
                "Discarding superseded result"
            );
            return false;
        }

        if succeeded {
            if !ticket.is_cached() && !self.config.recency_window.is_zero() {
                self.recent.insert(ticket.key().clone(), Instant::now());
            }
            self.current_key = Some(ticket.key().clone());
        }
        true
    }

    /// Turn a `UseCached` ticket into a network fetch when its cached set
    /// is gone. The generation is kept, so the ticket stays current.
    pub fn cache_missed(&mut self, ticket: FetchTicket) -> FetchTicket {
        self.stats.record_fetch();
        debug!(
            generation = ticket.generation(),
            key = %ticket.key(),
            "Cached set evicted, fetching"
        );
        ticket.into_network()
    }

    pub fn stats(&self) -> Arc<SchedulerStats> {
        Arc::clone(&self.stats)
    }

    fn key_for(&self, viewport: &Viewport, filter: &TypeFilter) -> QueryKey {
        QueryKey::for_viewport(viewport, filter.clone(), self.config.center_precision)
    }

    fn recently_fetched(&mut self, key: &QueryKey) -> bool {
        let window = self.config.recency_window;
        if window.is_zero() {
            return false;
        }
        self.recent.retain(|_, at| at.elapsed() < window);
        self.recent.contains_key(key)
    }

    fn issue_fetch(&mut self, key: QueryKey) -> FetchTicket {
        self.stats.record_fetch();
        let ticket = self.issue(key);
        debug!(
            generation = ticket.generation(),
            key = %ticket.key(),
            "Fetch scheduled"
        );
        ticket
    }

    fn issue(&mut self, key: QueryKey) -> FetchTicket {
        self.generation += 1;
        FetchTicket::new(
            self.generation,
            NearbyQuery::first_page(key, self.config.page_limit),
        )
    }
}

impl Default for RefetchScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}
