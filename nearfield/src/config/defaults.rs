//! Default values and constants for all configuration settings.

use super::file::config_directory;
use super::settings::*;
use crate::geo::GeoPoint;
use crate::position::DesiredAccuracy;
use crate::repository::{
    DEFAULT_BASE_URL, DEFAULT_CENTER_PRECISION, DEFAULT_HTTP_TIMEOUT, DEFAULT_PAGE_LIMIT,
    DEFAULT_RADIUS_M,
};

/// Default position timeout in seconds.
pub const DEFAULT_POSITION_TIMEOUT_SECS: u64 = 10;

/// Default recency window in seconds (every settle fetches).
pub const DEFAULT_RECENCY_WINDOW_SECS: u64 = 0;

/// Fallback latitude (Seattle Space Needle).
pub const DEFAULT_FALLBACK_LAT: f64 = 47.6205;

/// Fallback longitude (Seattle Space Needle).
pub const DEFAULT_FALLBACK_LON: f64 = -122.3493;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "nearfield.log";

/// The fallback coordinate as a point.
pub fn default_fallback_point() -> GeoPoint {
    GeoPoint::from_valid(DEFAULT_FALLBACK_LAT, DEFAULT_FALLBACK_LON)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            api: ApiSettings {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout_secs: DEFAULT_HTTP_TIMEOUT.as_secs(),
                token: None,
            },
            query: QuerySettings {
                default_radius_m: DEFAULT_RADIUS_M,
                page_limit: DEFAULT_PAGE_LIMIT,
                center_precision: DEFAULT_CENTER_PRECISION,
            },
            scheduler: SchedulerSettings {
                recency_window_secs: DEFAULT_RECENCY_WINDOW_SECS,
            },
            position: PositionSettings {
                accuracy: DesiredAccuracy::default(),
                timeout_secs: DEFAULT_POSITION_TIMEOUT_SECS,
                fallback: default_fallback_point(),
            },
            logging: LoggingSettings {
                file: config_directory().join(DEFAULT_LOG_FILE),
            },
        }
    }
}
