//! Core state types for user position tracking.
//!
//! - [`UserPosition`] - A single location reading with metadata
//! - [`PositionOrigin`] - Where did this reading come from?
//! - [`PermissionStatus`] - Has the user allowed location access?
//! - [`DesiredAccuracy`] - How precise a reading the caller wants
//! - [`PositionChange`] - What subscribers receive

use std::fmt;
use std::time::Instant;

use crate::geo::GeoPoint;

/// Location permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionStatus {
    /// The user allowed location access.
    Granted,
    /// The user refused location access.
    Denied,
    /// The user has not been asked yet.
    #[default]
    Undetermined,
}

impl PermissionStatus {
    #[inline]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
            Self::Undetermined => write!(f, "undetermined"),
        }
    }
}

/// Accuracy hint passed to the platform when requesting a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DesiredAccuracy {
    /// Best available (GPS).
    #[default]
    High,
    /// Balanced power/accuracy (Wi-Fi, cell).
    Balanced,
    /// Coarse location only.
    Low,
}

impl DesiredAccuracy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Balanced => "balanced",
            Self::Low => "low",
        }
    }
}

impl std::str::FromStr for DesiredAccuracy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "balanced" => Ok(Self::Balanced),
            "low" => Ok(Self::Low),
            other => Err(format!(
                "unknown accuracy '{}': expected high, balanced or low",
                other
            )),
        }
    }
}

/// Source of a position reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionOrigin {
    /// From the device location service.
    Device,
    /// A caller-supplied fallback coordinate.
    Manual,
}

impl fmt::Display for PositionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => write!(f, "Device"),
            Self::Manual => write!(f, "Manual"),
        }
    }
}

/// A single location reading.
///
/// Readings are never merged or averaged: a later-timestamped reading
/// replaces the current one wholesale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserPosition {
    pub point: GeoPoint,

    /// Horizontal accuracy radius reported by the platform.
    pub accuracy_meters: f32,

    /// When the reading was taken.
    pub timestamp: Instant,

    pub origin: PositionOrigin,
}

impl UserPosition {
    /// Create a device reading taken now.
    pub fn from_device(point: GeoPoint, accuracy_meters: f32) -> Self {
        Self {
            point,
            accuracy_meters,
            timestamp: Instant::now(),
            origin: PositionOrigin::Device,
        }
    }

    /// Create a manual fallback reading taken now.
    ///
    /// Manual coordinates report zero accuracy radius; they are exact by
    /// definition, even if they are not where the user actually is.
    pub fn manual(point: GeoPoint) -> Self {
        Self {
            point,
            accuracy_meters: 0.0,
            timestamp: Instant::now(),
            origin: PositionOrigin::Manual,
        }
    }

    /// Replace the timestamp (used by scripted sources and tests).
    pub fn at(mut self, timestamp: Instant) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Notification broadcast to position subscribers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionChange {
    /// A new reading superseded the previous one.
    Updated(UserPosition),
    /// The reading was discarded (permission revoked or cleared).
    Lost,
}
