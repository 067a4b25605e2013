//! Proximity engine - the event loop tying the components together.
//!
//! # Architecture
//!
//! ```text
//! PositionSource ──broadcast──┐
//! ViewportTracker ──watch─────┤
//! EngineHandle ──commands─────┼──► ProximityEngine ──watch──► EngineSnapshot
//! fetch tasks ──completions───┘        │
//!                                      ├─ RefetchScheduler (when to fetch)
//!                                      ├─ NearbyArtifactRepository (fetch)
//!                                      └─ VisibilityStateMachine (derive)
//! ```
//!
//! All mutation of the displayed set happens on the loop. Fetches run as
//! spawned tasks and report back over a channel; a completion is adopted
//! only if its ticket is still the latest.
//!
//! # Usage
//!
//! ```ignore
//! let (engine, handle) = ProximityEngine::new(repository, position, viewport, EngineConfig::default());
//! let token = CancellationToken::new();
//! tokio::spawn(engine.run(token.clone()));
//!
//! viewport.settle(&MapRegion::around(center));
//! let snapshot = handle.snapshot();
//! ```

mod error;
mod handle;
mod snapshot;

pub use error::EngineError;
pub use handle::EngineHandle;
pub use snapshot::EngineSnapshot;

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use handle::Command;

use crate::artifact::{ArtifactPage, TypeFilter};
use crate::position::{
    PermissionStatus, PositionBroadcaster, PositionChange, PositionError, PositionProvider,
    UserPosition,
};
use crate::repository::{ArtifactClient, FetchError, NearbyArtifactRepository};
use crate::scheduler::{
    FetchTicket, RefetchDecision, RefetchScheduler, SchedulerConfig, SchedulerStats,
};
use crate::viewport::{Viewport, ViewportTracker};
use crate::visibility::VisibilityStateMachine;

/// Default capacity of the command channel.
pub const DEFAULT_COMMAND_BUFFER: usize = 32;

/// Capacity of the fetch completion channel.
const COMPLETION_BUFFER: usize = 64;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub scheduler: SchedulerConfig,
    /// Filter active before the first `set_filter`.
    pub initial_filter: TypeFilter,
    pub command_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            initial_filter: TypeFilter::all(),
            command_buffer: DEFAULT_COMMAND_BUFFER,
        }
    }
}

/// A finished fetch, sent back to the loop.
struct FetchCompletion {
    ticket: FetchTicket,
    outcome: Result<Arc<ArtifactPage>, FetchError>,
}

/// Single-loop engine deriving proximity state for nearby artifacts.
pub struct ProximityEngine<C, P> {
    repository: NearbyArtifactRepository<C>,
    position: Arc<P>,
    viewport: Arc<ViewportTracker>,
    scheduler: RefetchScheduler,
    machine: VisibilityStateMachine,
    commands: mpsc::Receiver<Command>,
    completions_tx: mpsc::Sender<FetchCompletion>,
    completions_rx: mpsc::Receiver<FetchCompletion>,
    state_tx: watch::Sender<EngineSnapshot>,
    stale: bool,
    loading: bool,
    last_error: Option<EngineError>,
}

impl<C, P> ProximityEngine<C, P>
where
    C: ArtifactClient,
    P: PositionProvider + PositionBroadcaster + 'static,
{
    /// Build an engine and the handle used to drive and observe it.
    ///
    /// Nothing happens until [`run`](Self::run) is awaited.
    pub fn new(
        repository: NearbyArtifactRepository<C>,
        position: Arc<P>,
        viewport: Arc<ViewportTracker>,
        config: EngineConfig,
    ) -> (Self, EngineHandle) {
        let (command_tx, commands) = mpsc::channel(config.command_buffer.max(1));
        let (completions_tx, completions_rx) = mpsc::channel(COMPLETION_BUFFER);
        let (state_tx, state_rx) = watch::channel(EngineSnapshot::default());

        let mut machine = VisibilityStateMachine::new();
        machine.set_filter(config.initial_filter.clone());

        let engine = Self {
            repository,
            position,
            viewport,
            scheduler: RefetchScheduler::new(config.scheduler).with_filter(config.initial_filter),
            machine,
            commands,
            completions_tx,
            completions_rx,
            state_tx,
            stale: false,
            loading: false,
            last_error: None,
        };

        (engine, EngineHandle::new(command_tx, state_rx))
    }

    /// Scheduler counters, shared with the running loop.
    pub fn scheduler_stats(&self) -> Arc<SchedulerStats> {
        self.scheduler.stats()
    }

    /// Run the loop until cancelled, shut down, or every handle is dropped.
    pub async fn run(mut self, cancellation_token: CancellationToken) {
        info!(filter = %self.scheduler.filter(), "Proximity engine started");

        let mut position_rx = self.position.subscribe();
        let mut viewport_rx = self.viewport.subscribe();
        let mut position_open = true;
        let mut viewport_open = true;

        self.sync_position();
        let initial = *viewport_rx.borrow_and_update();
        if let Some(settled) = initial {
            self.on_settle(settled.viewport);
        }
        self.publish();

        loop {
            tokio::select! {
                biased;

                _ = cancellation_token.cancelled() => {
                    info!("Proximity engine cancelled");
                    break;
                }

                Some(completion) = self.completions_rx.recv() => {
                    self.on_completion(completion);
                }

                command = self.commands.recv() => match command {
                    Some(Command::SetFilter(filter)) => self.on_filter(filter),
                    Some(Command::Shutdown) | None => {
                        info!("Proximity engine shutting down");
                        break;
                    }
                },

                change = position_rx.recv(), if position_open => match change {
                    Ok(PositionChange::Updated(position)) => self.on_position(position),
                    Ok(PositionChange::Lost) => self.on_position_lost(),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Position updates lagged, resyncing");
                        self.sync_position();
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Position stream closed");
                        position_open = false;
                    }
                },

                changed = viewport_rx.changed(), if viewport_open => match changed {
                    Ok(()) => {
                        let settled = *viewport_rx.borrow_and_update();
                        if let Some(settled) = settled {
                            self.on_settle(settled.viewport);
                        }
                    }
                    Err(_) => {
                        debug!("Viewport tracker dropped");
                        viewport_open = false;
                    }
                },
            }

            self.publish();
        }

        self.scheduler.stats().log_stats();
        self.repository.log_stats();
    }

    fn on_settle(&mut self, viewport: Viewport) {
        match self.scheduler.viewport_settled(viewport) {
            Ok(decision) => self.apply(decision),
            Err(error) => {
                warn!(viewport = %viewport, error = %error, "Viewport not queryable");
                self.last_error = Some(error.into());
            }
        }
    }

    fn on_filter(&mut self, filter: TypeFilter) {
        match self.scheduler.filter_changed(filter.clone()) {
            Ok(decision) => {
                let transitions = self.machine.set_filter(filter.clone());
                debug!(filter = %filter, transitions = transitions.len(), "Filter applied");
                self.apply(decision);
            }
            Err(error) => {
                warn!(filter = %filter, error = %error, "Filter change rejected");
                self.last_error = Some(error.into());
            }
        }
    }

    fn on_position(&mut self, position: UserPosition) {
        let transitions = self.machine.update_position(position);
        if !transitions.is_empty() {
            debug!(
                position = %position.point,
                transitions = transitions.len(),
                "Visibility changed"
            );
        }
        if matches!(self.last_error, Some(EngineError::Position(_))) {
            self.last_error = None;
        }
        self.apply(self.scheduler.position_updated());
    }

    fn on_position_lost(&mut self) {
        self.machine.clear_position();
        if self.position.permission() == PermissionStatus::Denied {
            self.last_error = Some(PositionError::PermissionDenied.into());
        }
    }

    fn sync_position(&mut self) {
        match self.position.current_position() {
            Some(position) => self.on_position(position),
            None => self.on_position_lost(),
        }
    }

    fn apply(&mut self, decision: RefetchDecision) {
        match decision {
            RefetchDecision::Fetch(ticket) => self.spawn_fetch(ticket),
            RefetchDecision::UseCached(ticket) => match self.repository.cached(ticket.key()) {
                Some(set) => {
                    if self.scheduler.accept_completion(&ticket, true) {
                        self.loading = false;
                        self.stale = false;
                        self.last_error = None;
                        self.machine.set_artifacts(set.artifacts().iter().cloned());
                    }
                }
                // Evicted since; fall back to the network
                None => {
                    let ticket = self.scheduler.cache_missed(ticket);
                    self.spawn_fetch(ticket);
                }
            },
            RefetchDecision::Skip(reason) => trace!(?reason, "No fetch"),
        }
    }

    fn spawn_fetch(&mut self, ticket: FetchTicket) {
        self.loading = true;
        let repository = self.repository.clone();
        let completions = self.completions_tx.clone();

        tokio::spawn(async move {
            let outcome = repository.fetch(ticket.query()).await;
            // The loop may have exited; nothing left to tell
            let _ = completions.send(FetchCompletion { ticket, outcome }).await;
        });
    }

    fn on_completion(&mut self, completion: FetchCompletion) {
        let FetchCompletion { ticket, outcome } = completion;
        if !self.scheduler.accept_completion(&ticket, outcome.is_ok()) {
            return;
        }
        self.loading = false;

        match outcome {
            Ok(page) => {
                let transitions = self.machine.set_artifacts(page.artifacts.iter().cloned());
                debug!(
                    generation = ticket.generation(),
                    key = %ticket.key(),
                    artifacts = page.artifacts.len(),
                    transitions = transitions.len(),
                    "Result adopted"
                );
                self.stale = false;
                self.last_error = None;
            }
            Err(error) => {
                warn!(
                    generation = ticket.generation(),
                    key = %ticket.key(),
                    error = %error,
                    "Fetch failed, keeping last result"
                );
                self.stale = true;
                self.last_error = Some(error.into());
            }
        }
    }

    fn publish(&self) {
        let snapshot = EngineSnapshot {
            artifacts: self.machine.snapshot(),
            position: self.machine.position().copied(),
            query: self.scheduler.current_key().cloned(),
            stale: self.stale,
            loading: self.loading,
            last_error: self.last_error.clone(),
            generation: self.scheduler.generation(),
        };

        self.state_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}
