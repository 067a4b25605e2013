//! User position tracking.
//!
//! Provides a **single owner** for the user's current location reading and
//! the location permission status, abstracting over the platform location
//! service.
//!
//! # Architecture
//!
//! - The platform is reached only through the [`LocationService`] trait.
//! - [`PositionSource`] keeps the latest reading in a [`PositionModel`]:
//!   a strictly later timestamp supersedes, nothing is averaged.
//! - Changes are pushed to subscribers as [`PositionChange`] over a tokio
//!   broadcast channel.
//! - No timeouts or retries are applied here; callers wrap requests in
//!   `tokio::time::timeout` and may fall back to a manual coordinate.
//!
//! # Usage
//!
//! ```ignore
//! use nearfield::position::{PositionSource, StaticLocationService, PositionChange};
//!
//! let source = Arc::new(PositionSource::new(StaticLocationService::new()));
//! source.request_permission().await?;
//!
//! let mut rx = source.subscribe();
//! source.refresh(DesiredAccuracy::High).await?;
//! while let Ok(change) = rx.recv().await {
//!     // Handle position change
//! }
//! ```

mod error;
mod model;
mod provider;
mod service;
mod source;
mod state;

pub use error::PositionError;
pub use model::PositionModel;
pub use provider::{PositionBroadcaster, PositionProvider};
pub use service::{LocationService, ScriptedReading, StaticLocationService};
pub use source::PositionSource;
pub use state::{DesiredAccuracy, PermissionStatus, PositionChange, PositionOrigin, UserPosition};
