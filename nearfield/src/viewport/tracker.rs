//! Viewport tracker - publishes the settled map viewport.
//!
//! Map widgets report two kinds of events: continuous region changes while
//! the user drags or zooms, and a single settle once the gesture ends. Only
//! settles update the effective viewport and notify subscribers.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, trace};

use super::region::{MapRegion, Viewport};

/// A viewport together with the settle that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettledViewport {
    pub viewport: Viewport,

    /// Monotonic settle counter, starting at 1.
    pub sequence: u64,
}

/// Tracks the settled viewport and notifies on every settle.
pub struct ViewportTracker {
    tx: watch::Sender<Option<SettledViewport>>,
    settles: AtomicU64,
    gestures: AtomicU64,
}

impl Default for ViewportTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportTracker {
    /// Create a tracker with no viewport yet.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            tx,
            settles: AtomicU64::new(0),
            gestures: AtomicU64::new(0),
        }
    }

    /// Record an in-progress gesture. Subscribers are not notified.
    pub fn region_changing(&self, region: &MapRegion) {
        self.gestures.fetch_add(1, Ordering::Relaxed);
        trace!(center = %region.center, "Region changing");
    }

    /// Record the region the map settled on and notify subscribers.
    ///
    /// Every settle notifies, even if the viewport equals the previous one.
    pub fn settle(&self, region: &MapRegion) -> SettledViewport {
        self.settle_viewport(region.to_viewport())
    }

    /// Record a settled viewport directly.
    pub fn settle_viewport(&self, viewport: Viewport) -> SettledViewport {
        let sequence = self.settles.fetch_add(1, Ordering::Relaxed) + 1;
        let settled = SettledViewport { viewport, sequence };
        debug!(viewport = %viewport, sequence, "Viewport settled");
        self.tx.send_replace(Some(settled));
        settled
    }

    /// The most recent settled viewport.
    pub fn current(&self) -> Option<Viewport> {
        self.tx.borrow().map(|s| s.viewport)
    }

    /// Subscribe to settle notifications.
    pub fn subscribe(&self) -> watch::Receiver<Option<SettledViewport>> {
        self.tx.subscribe()
    }

    /// Number of settles recorded.
    pub fn settle_count(&self) -> u64 {
        self.settles.load(Ordering::Relaxed)
    }

    /// Number of unsettled region changes recorded.
    pub fn gesture_count(&self) -> u64 {
        self.gestures.load(Ordering::Relaxed)
    }
}
