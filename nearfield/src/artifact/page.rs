//! One page of nearby-query results.

use serde::Deserialize;
use tracing::warn;

use super::model::{Artifact, ArtifactRecord};

/// A decoded page from the nearby query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArtifactPage {
    /// Artifacts in server order.
    pub artifacts: Vec<Artifact>,

    /// Count reported by the server.
    pub total_count: u64,

    /// Whether a further page exists.
    pub has_more: bool,

    /// Records dropped during decode because they failed validation.
    pub dropped: usize,
}

#[derive(Deserialize)]
struct WirePage {
    artifacts: Vec<ArtifactRecord>,
    #[serde(default)]
    total_count: Option<u64>,
    #[serde(default)]
    has_more: bool,
}

impl ArtifactPage {
    /// Decode a response body.
    ///
    /// A structurally malformed body is an error. Individual records that
    /// fail validation are dropped and logged; they are never repaired.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let wire: WirePage = serde_json::from_slice(body)?;
        let received = wire.artifacts.len();

        let mut artifacts = Vec::with_capacity(received);
        for record in wire.artifacts {
            let id = record.id();
            match Artifact::try_from(record) {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => warn!(artifact_id = id, error = %e, "Dropping invalid artifact record"),
            }
        }

        Ok(Self {
            dropped: received - artifacts.len(),
            total_count: wire.total_count.unwrap_or(received as u64),
            has_more: wire.has_more,
            artifacts,
        })
    }
}
