//! Provider traits for user position.
//!
//! - [`PositionProvider`] - Query API (pull)
//! - [`PositionBroadcaster`] - Subscription API (push)
//!
//! The engine depends on these traits rather than on [`PositionSource`]
//! directly, so any position owner can drive it.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::service::LocationService;
use super::source::PositionSource;
use super::state::{PermissionStatus, PositionChange, UserPosition};

/// Trait for querying the user's position (pull API).
pub trait PositionProvider: Send + Sync {
    /// The latest reading, if any.
    fn current_position(&self) -> Option<UserPosition>;

    /// The last known permission status.
    fn permission(&self) -> PermissionStatus;

    /// Check if a reading is available.
    fn has_position(&self) -> bool {
        self.current_position().is_some()
    }
}

/// Trait for subscribing to position changes (push API).
pub trait PositionBroadcaster: Send + Sync {
    /// Subscribe to position changes.
    fn subscribe(&self) -> broadcast::Receiver<PositionChange>;
}

impl<S: LocationService> PositionProvider for PositionSource<S> {
    fn current_position(&self) -> Option<UserPosition> {
        PositionSource::current_position(self)
    }

    fn permission(&self) -> PermissionStatus {
        PositionSource::permission(self)
    }
}

impl<S: LocationService> PositionBroadcaster for PositionSource<S> {
    fn subscribe(&self) -> broadcast::Receiver<PositionChange> {
        PositionSource::subscribe(self)
    }
}

// Allow Arc-wrapped owners to be used as providers
impl<T: PositionProvider + ?Sized> PositionProvider for Arc<T> {
    fn current_position(&self) -> Option<UserPosition> {
        (**self).current_position()
    }

    fn permission(&self) -> PermissionStatus {
        (**self).permission()
    }
}

impl<T: PositionBroadcaster + ?Sized> PositionBroadcaster for Arc<T> {
    fn subscribe(&self) -> broadcast::Receiver<PositionChange> {
        (**self).subscribe()
    }
}
