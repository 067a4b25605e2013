//! Consumer-facing engine output.

use std::sync::Arc;

use super::error::EngineError;
use crate::artifact::ArtifactId;
use crate::position::UserPosition;
use crate::repository::QueryKey;
use crate::visibility::{ArtifactVisibility, Visibility};

/// Read-only view of the engine's current output.
///
/// Cloning is cheap: the artifact list is shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSnapshot {
    /// Active artifacts with their derived state, in fetch order.
    pub artifacts: Arc<Vec<ArtifactVisibility>>,

    /// Position the states were derived from.
    pub position: Option<UserPosition>,

    /// Query whose result is displayed.
    pub query: Option<QueryKey>,

    /// The latest fetch failed; `artifacts` is the last good set.
    pub stale: bool,

    /// A fetch for the latest ticket is outstanding.
    pub loading: bool,

    pub last_error: Option<EngineError>,

    /// Generation of the latest issued ticket.
    pub generation: u64,
}

impl EngineSnapshot {
    pub fn get(&self, id: ArtifactId) -> Option<&ArtifactVisibility> {
        self.artifacts.iter().find(|a| a.artifact.id == id)
    }

    /// AR entry gate: true only for a Viewable artifact.
    pub fn can_enter_ar(&self, id: ArtifactId) -> bool {
        self.get(id).is_some_and(|a| a.can_enter_ar())
    }

    pub fn count(&self, visibility: Visibility) -> usize {
        self.artifacts
            .iter()
            .filter(|a| a.visibility() == visibility)
            .count()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}
