//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

use crate::geo::GeoPoint;
use crate::position::DesiredAccuracy;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Remote endpoint settings
    pub api: ApiSettings,
    /// Nearby query settings
    pub query: QuerySettings,
    /// Refetch scheduling settings
    pub scheduler: SchedulerSettings,
    /// Position acquisition settings
    pub position: PositionSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Remote endpoint configuration.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// API root, without a trailing slash
    pub base_url: String,
    /// Timeout in seconds for HTTP requests
    pub timeout_secs: u64,
    /// Bearer token, if the endpoint requires one
    pub token: Option<String>,
}

/// Nearby query configuration.
#[derive(Debug, Clone)]
pub struct QuerySettings {
    /// Radius used when none is given, in meters
    pub default_radius_m: u32,
    /// Artifacts per page
    pub page_limit: u32,
    /// Decimal places kept when keying a query center
    pub center_precision: u8,
}

/// Refetch scheduling configuration.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Seconds a successful result answers an identical settle (0 = never)
    pub recency_window_secs: u64,
}

/// Position acquisition configuration.
#[derive(Debug, Clone)]
pub struct PositionSettings {
    pub accuracy: DesiredAccuracy,
    /// Seconds to wait for a reading before falling back
    pub timeout_secs: u64,
    /// Manual coordinate used when no reading arrives
    pub fallback: GeoPoint,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
