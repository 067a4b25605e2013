//! Visibility state machine.
//!
//! Combines the current artifact set, the active type filter and the latest
//! position into the consumer-facing list of artifacts with their derived
//! state. The list is recomputed once per change and shared as an `Arc`,
//! so reads never recompute.
//!
//! Transitions happen only on a new position, a new artifact set or a
//! filter change. There is no time-based transition and no hysteresis.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::guidance::{MarkerTone, ProximityGuidance};
use super::state::{Visibility, VisibilityState};
use crate::artifact::{Artifact, ArtifactId, TypeFilter};
use crate::position::UserPosition;

/// An artifact together with its derived state.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactVisibility {
    pub artifact: Artifact,
    pub state: VisibilityState,
}

impl ArtifactVisibility {
    pub fn visibility(&self) -> Visibility {
        self.state.visibility()
    }

    pub fn can_enter_ar(&self) -> bool {
        self.state.can_enter_ar()
    }

    pub fn guidance(&self) -> ProximityGuidance {
        ProximityGuidance::for_state(&self.state, &self.artifact.view_distance)
    }

    pub fn tone(&self) -> MarkerTone {
        MarkerTone::for_visibility(self.visibility())
    }
}

/// A change in one artifact's tier.
///
/// `from` is `None` for an artifact entering the active set; `to` is `None`
/// for one leaving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityTransition {
    pub artifact_id: ArtifactId,
    pub from: Option<Visibility>,
    pub to: Option<Visibility>,
}

/// Derives and tracks visibility for the active artifact set.
#[derive(Debug, Default)]
pub struct VisibilityStateMachine {
    /// Full set as last fetched, before filtering.
    artifacts: Vec<Artifact>,
    filter: TypeFilter,
    position: Option<UserPosition>,
    derived: Arc<Vec<ArtifactVisibility>>,
    tiers: HashMap<ArtifactId, Visibility>,
}

impl VisibilityStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the artifact set (a new fetch result).
    pub fn set_artifacts(
        &mut self,
        artifacts: impl IntoIterator<Item = Artifact>,
    ) -> Vec<VisibilityTransition> {
        self.artifacts = artifacts.into_iter().collect();
        self.recompute()
    }

    /// Apply a new position reading.
    pub fn update_position(&mut self, position: UserPosition) -> Vec<VisibilityTransition> {
        self.position = Some(position);
        self.recompute()
    }

    /// Forget the position; everything becomes Hidden.
    pub fn clear_position(&mut self) -> Vec<VisibilityTransition> {
        self.position = None;
        self.recompute()
    }

    /// Narrow (or widen) the active set to a type filter.
    pub fn set_filter(&mut self, filter: TypeFilter) -> Vec<VisibilityTransition> {
        self.filter = filter;
        self.recompute()
    }

    pub fn filter(&self) -> &TypeFilter {
        &self.filter
    }

    pub fn position(&self) -> Option<&UserPosition> {
        self.position.as_ref()
    }

    /// The derived list, in fetch order.
    pub fn snapshot(&self) -> Arc<Vec<ArtifactVisibility>> {
        Arc::clone(&self.derived)
    }

    /// Derived state of one active artifact.
    pub fn state_of(&self, id: ArtifactId) -> Option<VisibilityState> {
        self.derived
            .iter()
            .find(|a| a.artifact.id == id)
            .map(|a| a.state)
    }

    /// Whether the AR view may be opened for `id`. Unknown ids are denied.
    pub fn can_enter_ar(&self, id: ArtifactId) -> bool {
        self.state_of(id).is_some_and(|s| s.can_enter_ar())
    }

    /// Active artifacts in a given tier.
    pub fn count(&self, visibility: Visibility) -> usize {
        self.derived
            .iter()
            .filter(|a| a.visibility() == visibility)
            .count()
    }

    fn is_active(&self, artifact: &Artifact) -> bool {
        artifact.is_published() && self.filter.allows(artifact.artifact_type)
    }

    fn recompute(&mut self) -> Vec<VisibilityTransition> {
        let position = self.position.as_ref();
        let derived: Vec<ArtifactVisibility> = self
            .artifacts
            .iter()
            .filter(|a| self.is_active(a))
            .map(|a| ArtifactVisibility {
                state: VisibilityState::evaluate(a, position),
                artifact: a.clone(),
            })
            .collect();

        let mut tiers = HashMap::with_capacity(derived.len());
        let mut transitions = Vec::new();
        for entry in &derived {
            let to = entry.visibility();
            let from = self.tiers.get(&entry.artifact.id).copied();
            if from != Some(to) {
                transitions.push(VisibilityTransition {
                    artifact_id: entry.artifact.id,
                    from,
                    to: Some(to),
                });
            }
            tiers.insert(entry.artifact.id, to);
        }
        for (&id, &from) in &self.tiers {
            if !tiers.contains_key(&id) {
                transitions.push(VisibilityTransition {
                    artifact_id: id,
                    from: Some(from),
                    to: None,
                });
            }
        }

        if !transitions.is_empty() {
            debug!(
                active = derived.len(),
                transitions = transitions.len(),
                "Visibility recomputed"
            );
        }

        self.tiers = tiers;
        self.derived = Arc::new(derived);
        transitions
    }
}
