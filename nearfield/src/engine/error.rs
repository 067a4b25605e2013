//! Engine errors.

use thiserror::Error;

use crate::position::PositionError;
use crate::repository::FetchError;

/// The last failure seen by the engine, as surfaced in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Position(#[from] PositionError),

    /// The engine loop is no longer running.
    #[error("proximity engine stopped")]
    Stopped,
}
