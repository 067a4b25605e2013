//! Handle for talking to a running engine.

use tokio::sync::{mpsc, watch};

use super::error::EngineError;
use super::snapshot::EngineSnapshot;
use crate::artifact::{ArtifactId, TypeFilter};

/// Commands accepted by the engine loop.
#[derive(Debug)]
pub(crate) enum Command {
    SetFilter(TypeFilter),
    Shutdown,
}

/// Cloneable front for a [`ProximityEngine`](super::ProximityEngine).
///
/// Dropping every handle stops the engine.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<EngineSnapshot>,
}

impl EngineHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        state: watch::Receiver<EngineSnapshot>,
    ) -> Self {
        Self { commands, state }
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.state.borrow().clone()
    }

    /// Whether the AR view may be opened for `id` right now.
    pub fn can_enter_ar(&self, id: ArtifactId) -> bool {
        self.state.borrow().can_enter_ar(id)
    }

    /// Change the type filter.
    ///
    /// The displayed set narrows as soon as the engine handles the command;
    /// the refetch for the new filter follows.
    pub async fn set_filter(&self, filter: TypeFilter) -> Result<(), EngineError> {
        self.commands
            .send(Command::SetFilter(filter))
            .await
            .map_err(|_| EngineError::Stopped)
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.state.clone()
    }

    /// Ask the engine loop to exit.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| EngineError::Stopped)
    }

    /// Whether the engine loop has exited.
    pub fn is_stopped(&self) -> bool {
        self.commands.is_closed()
    }
}
