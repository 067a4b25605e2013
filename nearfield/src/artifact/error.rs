//! Artifact validation errors.

use thiserror::Error;

use crate::geo::GeoError;

/// Reasons an artifact record or filter string is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArtifactError {
    #[error("invalid artifact location: {0}")]
    InvalidLocation(#[from] GeoError),

    #[error("invalid view distance band: min {min} m, max {max} m (need 0 <= min < max)")]
    InvalidViewDistance { min: f64, max: f64 },

    #[error("unknown artifact type '{0}'")]
    UnknownType(String),

    #[error("unknown {field} '{value}'")]
    UnknownValue { field: &'static str, value: String },
}
