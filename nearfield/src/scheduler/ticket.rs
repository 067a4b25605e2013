//! Tickets and decisions.

use crate::repository::{NearbyQuery, QueryKey};

/// One issued fetch, tagged with its generation.
///
/// Generations increase strictly with every issued ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    query: NearbyQuery,
    /// Served from the repository cache rather than the network.
    cached: bool,
}

impl FetchTicket {
    pub(crate) fn new(generation: u64, query: NearbyQuery) -> Self {
        Self {
            generation,
            query,
            cached: false,
        }
    }

    pub(crate) fn into_cached(mut self) -> Self {
        self.cached = true;
        self
    }

    pub(crate) fn into_network(mut self) -> Self {
        self.cached = false;
        self
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &NearbyQuery {
        &self.query
    }

    pub fn key(&self) -> &QueryKey {
        &self.query.key
    }

    /// Whether this ticket adopts a cached set instead of fetching.
    pub fn is_cached(&self) -> bool {
        self.cached
    }
}

/// Why no fetch was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing has settled yet, so there is no area to query.
    NoViewport,
    /// Position changes only update derived state.
    PositionOnly,
    /// The requested filter is already active.
    FilterUnchanged,
}

/// What the engine should do after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefetchDecision {
    /// Issue a network fetch for the ticket's query.
    Fetch(FetchTicket),
    /// Adopt the repository's cached set for the ticket's key.
    UseCached(FetchTicket),
    /// Do nothing.
    Skip(SkipReason),
}

impl RefetchDecision {
    /// The ticket carried by this decision, if any.
    pub fn ticket(&self) -> Option<&FetchTicket> {
        match self {
            Self::Fetch(ticket) | Self::UseCached(ticket) => Some(ticket),
            Self::Skip(_) => None,
        }
    }

    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}
