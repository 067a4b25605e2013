//! Nearby artifact repository.
//!
//! Fetches artifacts near a point from the remote query endpoint,
//! deduplicates concurrent equivalent requests and caches the latest
//! merged result set per query key.
//!
//! # Components
//!
//! - [`query`] types - `QueryKey`, `Page`, `NearbyQuery`, `NearbyRequest`
//! - [`ArtifactClient`] - the endpoint boundary, with [`HttpArtifactClient`]
//!   (reqwest) and [`ScriptedArtifactClient`] (in-memory)
//! - [`InFlightRegistry`] - explicit per-key slot states for dedup
//! - [`ArtifactSet`] - merged pages for one key, kept for the most
//!   recently used keys
//! - [`NearbyArtifactRepository`] - ties the above together

mod cache;
mod client;
mod coalesce;
mod error;
mod nearby;
pub mod query;
mod scripted;
mod set;

pub use cache::DEFAULT_MAX_CACHED_KEYS;
pub use client::{
    ArtifactClient, ClientConfig, HttpArtifactClient, DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT,
};
pub use coalesce::{
    CoalescerStatsSnapshot, FetchOutcome, InFlightRegistry, LeaderGuard, Registration,
    RequestKey, SlotState,
};
pub use error::FetchError;
pub use nearby::{NearbyArtifactRepository, RepositoryConfig};
pub use query::{
    NearbyQuery, NearbyRequest, Page, QueryKey, DEFAULT_CENTER_PRECISION, DEFAULT_PAGE_LIMIT,
    DEFAULT_RADIUS_M, MAX_CENTER_PRECISION, MAX_PAGE_LIMIT, MAX_RADIUS_M,
};
pub use scripted::ScriptedArtifactClient;
pub use set::ArtifactSet;
