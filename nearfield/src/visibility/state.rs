//! Per-artifact visibility derivation.

use std::fmt;

use crate::artifact::{Artifact, ArtifactId, ViewDistance};
use crate::geo::distance_meters;
use crate::position::UserPosition;

/// Visibility tiers, in order of strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Visibility {
    /// Out of range, or position unknown.
    Hidden,
    /// In range but closer than the minimum view distance.
    Locked,
    /// In range and not locked: AR entry allowed.
    Viewable,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hidden => write!(f, "Hidden"),
            Self::Locked => write!(f, "Locked"),
            Self::Viewable => write!(f, "Viewable"),
        }
    }
}

/// Derived visibility of one artifact relative to the user.
///
/// Never stored: recomputed from the artifact's band and the latest
/// position whenever either changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityState {
    pub artifact_id: ArtifactId,

    /// Great-circle distance to the user, `None` without a position.
    pub distance_meters: Option<f64>,

    /// `distance <= max_view_distance`; false without a position.
    pub is_in_range: bool,

    /// `is_in_range && distance < min_view_distance`.
    pub is_locked: bool,
}

impl VisibilityState {
    /// Evaluate an artifact against an optional position.
    pub fn evaluate(artifact: &Artifact, position: Option<&UserPosition>) -> Self {
        let distance = position.map(|p| distance_meters(p.point, artifact.location));
        Self::from_distance(artifact.id, &artifact.view_distance, distance)
    }

    /// Derive the state from a known (or unknown) distance.
    pub fn from_distance(
        artifact_id: ArtifactId,
        band: &ViewDistance,
        distance_meters: Option<f64>,
    ) -> Self {
        let (is_in_range, is_locked) = match distance_meters {
            Some(d) => {
                let in_range = d <= band.max();
                (in_range, in_range && d < band.min())
            }
            None => (false, false),
        };
        Self {
            artifact_id,
            distance_meters,
            is_in_range,
            is_locked,
        }
    }

    /// Collapse the flags into a tier.
    pub fn visibility(&self) -> Visibility {
        match (self.is_in_range, self.is_locked) {
            (false, _) => Visibility::Hidden,
            (true, true) => Visibility::Locked,
            (true, false) => Visibility::Viewable,
        }
    }

    /// Whether the AR view may be opened for this artifact.
    #[inline]
    pub fn can_enter_ar(&self) -> bool {
        self.is_in_range && !self.is_locked
    }
}
