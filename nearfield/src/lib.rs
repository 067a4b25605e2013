//! Nearfield - proximity-gated visibility for location-anchored artifacts.
//!
//! This library discovers artifacts anchored near the user, keeps them in
//! sync with the map viewport, and derives per-artifact visibility from the
//! user's distance: an artifact is only viewable in AR from within its view
//! distance band.
//!
//! # High-Level API
//!
//! The [`engine`] module wires every component into a single event loop:
//!
//! ```ignore
//! use nearfield::engine::{EngineConfig, ProximityEngine};
//! use nearfield::repository::{HttpArtifactClient, NearbyArtifactRepository};
//!
//! let repository = NearbyArtifactRepository::new(client, RepositoryConfig::default());
//! let (engine, handle) = ProximityEngine::new(repository, position, viewport, EngineConfig::default());
//! tokio::spawn(engine.run(cancellation_token));
//!
//! if handle.can_enter_ar(artifact_id) {
//!     // open the AR view
//! }
//! ```
//!
//! # Modules
//!
//! - [`geo`] - Great-circle distance and coordinate types
//! - [`position`] - User position, permission and location services
//! - [`viewport`] - Settled map viewport tracking
//! - [`artifact`] - Artifact data model and type filters
//! - [`repository`] - Nearby queries, request coalescing and caching
//! - [`visibility`] - Hidden / Locked / Viewable derivation
//! - [`scheduler`] - When to refetch, and which results to keep
//! - [`engine`] - The event loop and consumer-facing snapshots

pub mod artifact;
pub mod config;
pub mod engine;
pub mod geo;
pub mod logging;
pub mod position;
pub mod repository;
pub mod scheduler;
pub mod viewport;
pub mod visibility;

/// Version of the Nearfield library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
