//! Proximity-gated visibility.
//!
//! Each artifact carries a view-distance band `[min, max]` in meters. With
//! the user at distance `d`:
//!
//! - `d > max` (or no position) is **Hidden**
//! - `d < min` is **Locked**: in range but too close
//! - otherwise **Viewable**: the AR view may be opened
//!
//! Both boundaries belong to the viewable band: `d == max` is in range and
//! `d == min` is not locked.

mod guidance;
mod machine;
mod state;

pub use guidance::{format_distance, format_distance_away, MarkerTone, ProximityGuidance};
pub use machine::{ArtifactVisibility, VisibilityStateMachine, VisibilityTransition};
pub use state::{Visibility, VisibilityState};
