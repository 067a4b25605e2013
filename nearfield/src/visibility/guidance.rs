//! What to tell the user about an artifact's proximity.

use std::fmt;

use super::state::{Visibility, VisibilityState};
use crate::artifact::ViewDistance;

/// Next step the user must take to view an artifact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProximityGuidance {
    /// No position yet.
    PositionUnknown,
    /// Too far: come within `within_meters`.
    MoveCloser { within_meters: f64 },
    /// Too close: back off to at least `at_least_meters`.
    MoveAway { at_least_meters: f64 },
    /// Viewable now.
    Ready,
}

impl ProximityGuidance {
    pub fn for_state(state: &VisibilityState, band: &ViewDistance) -> Self {
        if state.distance_meters.is_none() {
            return Self::PositionUnknown;
        }
        match state.visibility() {
            Visibility::Hidden => Self::MoveCloser {
                within_meters: band.max(),
            },
            Visibility::Locked => Self::MoveAway {
                at_least_meters: band.min(),
            },
            Visibility::Viewable => Self::Ready,
        }
    }
}

impl fmt::Display for ProximityGuidance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PositionUnknown => write!(f, "Waiting for your location"),
            Self::MoveCloser { within_meters } => {
                write!(f, "Move within {}m to view", within_meters)
            }
            Self::MoveAway { at_least_meters } => {
                write!(f, "Move ≥ {}m away to unlock", at_least_meters)
            }
            Self::Ready => write!(f, "Ready to view in AR"),
        }
    }
}

/// Marker color per visibility tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerTone {
    Gray,
    Red,
    Green,
}

impl MarkerTone {
    pub fn for_visibility(visibility: Visibility) -> Self {
        match visibility {
            Visibility::Hidden => Self::Gray,
            Visibility::Locked => Self::Red,
            Visibility::Viewable => Self::Green,
        }
    }

    /// Hex color used by the map markers.
    pub fn hex(&self) -> &'static str {
        match self {
            Self::Gray => "#9CA3AF",
            Self::Red => "#EF4444",
            Self::Green => "#10B981",
        }
    }
}

/// Short distance label for markers: `"150m"`, `"1.5km"`.
pub fn format_distance(meters: Option<f64>) -> String {
    match meters {
        None => "Distance unknown".to_string(),
        Some(d) if d < 1000.0 => format!("{}m", d.round() as i64),
        Some(d) => format!("{:.1}km", d / 1000.0),
    }
}

/// Distance label for detail panels: `"150m away"`.
pub fn format_distance_away(meters: Option<f64>) -> String {
    match meters {
        None => format_distance(None),
        some => format!("{} away", format_distance(some)),
    }
}
