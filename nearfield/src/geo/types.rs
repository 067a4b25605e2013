//! Geographic point type

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Errors that can occur when constructing a geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoError {
    #[error("invalid latitude {0}: must be between {MIN_LAT} and {MAX_LAT}")]
    InvalidLatitude(f64),

    #[error("invalid longitude {0}: must be between {MIN_LON} and {MAX_LON}")]
    InvalidLongitude(f64),
}

/// A validated WGS-84 coordinate in degrees.
///
/// Fields are private so that every `GeoPoint` in circulation is known to
/// be in range; construct one with [`GeoPoint::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint", into = "RawPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Creates a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&latitude) {
            return Err(GeoError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(MIN_LON..=MAX_LON).contains(&longitude) {
            return Err(GeoError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Builds a point from values already known to be in range.
    pub(crate) fn from_valid(latitude: f64, longitude: f64) -> Self {
        debug_assert!((MIN_LAT..=MAX_LAT).contains(&latitude));
        debug_assert!((MIN_LON..=MAX_LON).contains(&longitude));
        Self {
            latitude,
            longitude,
        }
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Snaps the point to a grid of `precision` decimal places.
    ///
    /// Two points that land on the same grid cell produce equal
    /// [`QuantizedPoint`]s and can share a cache key.
    pub fn quantize(&self, precision: u8) -> QuantizedPoint {
        let scale = 10f64.powi(precision as i32);
        QuantizedPoint {
            lat_units: (self.latitude * scale).round() as i64,
            lon_units: (self.longitude * scale).round() as i64,
            precision,
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// A point snapped to a fixed decimal grid.
///
/// Stored as integer grid units so it is hashable and compares exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuantizedPoint {
    lat_units: i64,
    lon_units: i64,
    precision: u8,
}

impl QuantizedPoint {
    /// Number of decimal places the grid keeps.
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// The grid cell's center as a regular point.
    pub fn center(&self) -> GeoPoint {
        let scale = 10f64.powi(self.precision as i32);
        let latitude = (self.lat_units as f64 / scale).clamp(MIN_LAT, MAX_LAT);
        let longitude = (self.lon_units as f64 / scale).clamp(MIN_LON, MAX_LON);
        GeoPoint::from_valid(latitude, longitude)
    }
}

impl fmt::Display for QuantizedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let center = self.center();
        let digits = self.precision as usize;
        write!(
            f,
            "{:.*},{:.*}",
            digits,
            center.latitude(),
            digits,
            center.longitude()
        )
    }
}

/// Wire shape used for serde validation.
#[derive(Serialize, Deserialize)]
struct RawPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.latitude, raw.longitude)
    }
}

impl From<GeoPoint> for RawPoint {
    fn from(point: GeoPoint) -> Self {
        RawPoint {
            latitude: point.latitude,
            longitude: point.longitude,
        }
    }
}
