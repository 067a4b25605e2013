//! Map region and effective viewport types.

use std::fmt;

use crate::geo::{meters_per_degree_latitude, meters_per_degree_longitude, GeoPoint};
use crate::repository::MAX_RADIUS_M;

/// A map region as reported by a map widget.
///
/// Deltas are the full visible span in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRegion {
    pub center: GeoPoint,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl MapRegion {
    /// Default span of the map screen (~1.1 km north-south).
    pub const DEFAULT_DELTA: f64 = 0.01;

    pub fn new(center: GeoPoint, latitude_delta: f64, longitude_delta: f64) -> Self {
        Self {
            center,
            latitude_delta,
            longitude_delta,
        }
    }

    /// A region with the default span around `center`.
    pub fn around(center: GeoPoint) -> Self {
        Self::new(center, Self::DEFAULT_DELTA, Self::DEFAULT_DELTA)
    }

    /// Collapse the region into a center and radius.
    pub fn to_viewport(&self) -> Viewport {
        Viewport::from_region(self)
    }
}

/// The effective query area: a center and a radius in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: GeoPoint,
    pub radius_meters: u32,
}

impl Viewport {
    pub fn new(center: GeoPoint, radius_meters: u32) -> Self {
        Self {
            center,
            radius_meters,
        }
    }

    /// Derive a viewport from a map region.
    ///
    /// The radius is half the larger of the two spans, measured in meters
    /// at the region's center, rounded up and never below 1 m. Regions
    /// wider than the endpoint allows are capped at [`MAX_RADIUS_M`], so a
    /// zoomed-out map still queries the area around its center.
    pub fn from_region(region: &MapRegion) -> Self {
        let lat_span = sanitize_delta(region.latitude_delta) * meters_per_degree_latitude();
        let lon_span = sanitize_delta(region.longitude_delta)
            * meters_per_degree_longitude(region.center.latitude());

        let half = lat_span.max(lon_span) / 2.0;
        let radius = half.ceil().clamp(1.0, MAX_RADIUS_M as f64) as u32;

        Self::new(region.center, radius)
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} r={}m", self.center, self.radius_meters)
    }
}

fn sanitize_delta(delta: f64) -> f64 {
    if delta.is_finite() {
        delta.abs()
    } else {
        0.0
    }
}
