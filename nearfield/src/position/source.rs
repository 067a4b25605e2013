//! Position source - the single owner of the user's current reading.
//!
//! Wraps a [`LocationService`] with a [`PositionModel`] and broadcasts a
//! [`PositionChange`] whenever the reading changes.
//!
//! # Usage
//!
//! ```ignore
//! let source = PositionSource::new(service);
//!
//! if source.request_permission().await? == PermissionStatus::Granted {
//!     match tokio::time::timeout(Duration::from_secs(10), source.refresh(DesiredAccuracy::High)).await {
//!         Ok(Ok(reading)) => println!("at {}", reading.point),
//!         _ => source.set_manual_position(fallback),
//!     };
//! }
//! ```

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::error::PositionError;
use super::model::PositionModel;
use super::service::LocationService;
use super::state::{DesiredAccuracy, PermissionStatus, PositionChange, UserPosition};
use crate::geo::GeoPoint;

/// Capacity of the position change channel.
const BROADCAST_CAPACITY: usize = 32;

/// Owns the current reading and the cached permission status.
pub struct PositionSource<S> {
    service: S,
    model: RwLock<PositionModel>,
    permission: RwLock<PermissionStatus>,
    broadcast_tx: broadcast::Sender<PositionChange>,
}

impl<S: LocationService> PositionSource<S> {
    /// Create a position source over a platform service.
    pub fn new(service: S) -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            service,
            model: RwLock::new(PositionModel::new()),
            permission: RwLock::new(PermissionStatus::Undetermined),
            broadcast_tx,
        }
    }

    /// The wrapped platform service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Mirror the platform's permission status without prompting.
    ///
    /// A status other than `Granted` discards any held reading.
    pub fn check_permission(&self) -> PermissionStatus {
        let status = self.service.permission_status();
        self.set_permission(status);
        status
    }

    /// Prompt for location access.
    pub async fn request_permission(&self) -> Result<PermissionStatus, PositionError> {
        let status = self.service.request_permission().await?;
        info!(%status, "Location permission resolved");
        self.set_permission(status);
        Ok(status)
    }

    /// Request one fresh reading and feed it to the model.
    ///
    /// Returns the reading the platform produced, whether or not it
    /// superseded the current one. A `PermissionDenied` failure also drops
    /// the held reading.
    pub async fn refresh(&self, accuracy: DesiredAccuracy) -> Result<UserPosition, PositionError> {
        match self.service.current_reading(accuracy).await {
            Ok(reading) => {
                self.apply_reading(reading);
                Ok(reading)
            }
            Err(PositionError::PermissionDenied) => {
                warn!("Location permission denied while refreshing");
                self.set_permission(PermissionStatus::Denied);
                Err(PositionError::PermissionDenied)
            }
            Err(e) => {
                debug!(error = %e, "Location refresh failed");
                Err(e)
            }
        }
    }

    /// Feed a reading from any source (e.g. a platform watch callback).
    ///
    /// Returns true if it superseded the current reading.
    pub fn apply_reading(&self, reading: UserPosition) -> bool {
        let accepted = self.model.write().apply_update(reading);
        if accepted {
            debug!(
                point = %reading.point,
                accuracy_m = reading.accuracy_meters,
                origin = %reading.origin,
                "Position updated"
            );
            // No receivers is fine
            let _ = self.broadcast_tx.send(PositionChange::Updated(reading));
        } else {
            debug!(point = %reading.point, "Ignoring reading older than current");
        }
        accepted
    }

    /// Use a caller-supplied coordinate when location is unavailable.
    pub fn set_manual_position(&self, point: GeoPoint) -> bool {
        info!(%point, "Using manual position");
        self.apply_reading(UserPosition::manual(point))
    }

    /// Forget the current reading.
    pub fn clear(&self) {
        if self.model.write().clear() {
            info!("Position cleared");
            let _ = self.broadcast_tx.send(PositionChange::Lost);
        }
    }

    /// The latest accepted reading.
    pub fn current_position(&self) -> Option<UserPosition> {
        self.model.read().current().copied()
    }

    /// The last known permission status.
    pub fn permission(&self) -> PermissionStatus {
        *self.permission.read()
    }

    /// Subscribe to position changes.
    pub fn subscribe(&self) -> broadcast::Receiver<PositionChange> {
        self.broadcast_tx.subscribe()
    }

    fn set_permission(&self, status: PermissionStatus) {
        *self.permission.write() = status;
        if status == PermissionStatus::Denied {
            self.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::service::{ScriptedReading, StaticLocationService};
    use crate::position::state::PositionOrigin;

    fn seattle() -> GeoPoint {
        GeoPoint::new(47.6205, -122.3493).unwrap()
    }

    #[tokio::test]
    async fn test_refresh_updates_and_broadcasts() {
        let source = PositionSource::new(StaticLocationService::granted_at(seattle(), 8.0));
        let mut rx = source.subscribe();

        let reading = source.refresh(DesiredAccuracy::High).await.unwrap();

        assert_eq!(source.current_position(), Some(reading));
        match rx.try_recv() {
            Ok(PositionChange::Updated(p)) => assert_eq!(p.point, seattle()),
            other => panic!("Expected an update, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_reading() {
        let source = PositionSource::new(StaticLocationService::granted_at(seattle(), 8.0));
        source.refresh(DesiredAccuracy::High).await.unwrap();

        source
            .service()
            .push(ScriptedReading::Fail(PositionError::Timeout));
        let result = source.refresh(DesiredAccuracy::High).await;

        assert_eq!(result, Err(PositionError::Timeout));
        assert!(source.current_position().is_some());
    }

    #[tokio::test]
    async fn test_denied_permission_clears_reading() {
        let source = PositionSource::new(StaticLocationService::granted_at(seattle(), 8.0));
        source.refresh(DesiredAccuracy::High).await.unwrap();
        let mut rx = source.subscribe();

        source.service().set_permission(PermissionStatus::Denied);
        let status = source.check_permission();

        assert_eq!(status, PermissionStatus::Denied);
        assert!(source.current_position().is_none());
        assert_eq!(rx.try_recv().unwrap(), PositionChange::Lost);
    }

    #[tokio::test]
    async fn test_request_permission_caches_status() {
        let source = PositionSource::new(StaticLocationService::new());
        assert_eq!(source.permission(), PermissionStatus::Undetermined);

        let status = source.request_permission().await.unwrap();

        assert_eq!(status, PermissionStatus::Granted);
        assert_eq!(source.permission(), PermissionStatus::Granted);
    }

    #[test]
    fn test_manual_position_is_a_reading() {
        let source = PositionSource::new(StaticLocationService::denied());

        assert!(source.set_manual_position(seattle()));

        let current = source.current_position().unwrap();
        assert_eq!(current.point, seattle());
        assert_eq!(current.origin, PositionOrigin::Manual);
    }

    #[test]
    fn test_clear_without_reading_is_silent() {
        let source = PositionSource::new(StaticLocationService::new());
        let mut rx = source.subscribe();

        source.clear();

        assert!(rx.try_recv().is_err(), "Nothing to announce");
    }
}
