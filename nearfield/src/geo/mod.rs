//! Great-circle geometry on a spherical earth.
//!
//! Every function here is pure and total over validated [`GeoPoint`]s.
//! Distances are in meters, bearings in degrees true (0-360, 0 = north,
//! 90 = east).
//!
//! # Usage
//!
//! ```
//! use nearfield::geo::{distance_meters, GeoPoint};
//!
//! let space_needle = GeoPoint::new(47.6205, -122.3493).unwrap();
//! let chihuly = GeoPoint::new(47.6205, -122.3506).unwrap();
//!
//! let d = distance_meters(space_needle, chihuly);
//! assert!(d > 90.0 && d < 110.0);
//! ```

mod types;

pub use types::{GeoError, GeoPoint, QuantizedPoint, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

use std::f64::consts::PI;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Degrees to radians conversion factor.
const DEG_TO_RAD: f64 = PI / 180.0;

/// Radians to degrees conversion factor.
const RAD_TO_DEG: f64 = 180.0 / PI;

/// Haversine great-circle distance between two points, in meters.
///
/// Symmetric in its arguments and exactly zero for identical points.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude() * DEG_TO_RAD;
    let lat2 = b.latitude() * DEG_TO_RAD;
    // Absolute deltas keep the result bit-identical when a and b swap.
    let dlat = (b.latitude() - a.latitude()).abs() * DEG_TO_RAD;
    let dlon = (b.longitude() - a.longitude()).abs() * DEG_TO_RAD;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Initial bearing from `from` to `to`, in degrees (0-360).
///
/// Returns 0 for identical points.
pub fn bearing_degrees(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude() * DEG_TO_RAD;
    let lat2 = to.latitude() * DEG_TO_RAD;
    let dlon = (to.longitude() - from.longitude()) * DEG_TO_RAD;

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    let bearing = y.atan2(x) * RAD_TO_DEG;
    (bearing + 360.0) % 360.0
}

/// The point reached by travelling `distance_m` meters from `from` along
/// the initial bearing `bearing_deg`.
///
/// Longitude is normalized to [-180, 180].
pub fn destination(from: GeoPoint, bearing_deg: f64, distance_m: f64) -> GeoPoint {
    let lat1 = from.latitude() * DEG_TO_RAD;
    let lon1 = from.longitude() * DEG_TO_RAD;
    let bearing = bearing_deg * DEG_TO_RAD;
    let angular = distance_m / EARTH_RADIUS_M;

    let (sin_lat1, cos_lat1) = lat1.sin_cos();
    let (sin_d, cos_d) = angular.sin_cos();

    let lat2 = (sin_lat1 * cos_d + cos_lat1 * sin_d * bearing.cos())
        .clamp(-1.0, 1.0)
        .asin();
    let lon2 = lon1 + (bearing.sin() * sin_d * cos_lat1).atan2(cos_d - sin_lat1 * lat2.sin());

    let latitude = (lat2 * RAD_TO_DEG).clamp(MIN_LAT, MAX_LAT);
    let longitude = normalize_longitude(lon2 * RAD_TO_DEG);

    GeoPoint::from_valid(latitude, longitude)
}

/// Meters covered by one degree of latitude.
#[inline]
pub fn meters_per_degree_latitude() -> f64 {
    EARTH_RADIUS_M * DEG_TO_RAD
}

/// Meters covered by one degree of longitude at the given latitude.
#[inline]
pub fn meters_per_degree_longitude(latitude: f64) -> f64 {
    meters_per_degree_latitude() * (latitude * DEG_TO_RAD).cos().abs()
}

fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 540.0) % 360.0 - 180.0;
    wrapped.clamp(MIN_LON, MAX_LON)
}
