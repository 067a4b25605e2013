//! Map viewport tracking.
//!
//! The map widget reports regions as a center plus degree spans; the rest of
//! the engine works with a [`Viewport`] (center plus radius in meters). The
//! [`ViewportTracker`] publishes only settled viewports over a tokio watch
//! channel.

mod region;
mod tracker;

pub use region::{MapRegion, Viewport};
pub use tracker::{SettledViewport, ViewportTracker};
