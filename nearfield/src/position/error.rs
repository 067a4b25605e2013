//! Position error types.

use thiserror::Error;

/// Failures reported by a [`LocationService`](super::LocationService).
///
/// None of these are retried automatically. With no reading available,
/// every artifact derives as Hidden.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    /// The user refused location access.
    #[error("location permission denied")]
    PermissionDenied,

    /// The platform did not produce a reading in time.
    #[error("timed out waiting for a location reading")]
    Timeout,

    /// Location services are off or the sensor failed.
    #[error("location unavailable: {0}")]
    Unavailable(String),
}
