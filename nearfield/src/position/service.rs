//! Platform location service boundary.
//!
//! The [`LocationService`] trait abstracts over the device's location
//! APIs so the rest of the engine never touches a platform SDK directly.
//! [`StaticLocationService`] is a scripted implementation used by tests
//! and the command-line front end.

use std::collections::VecDeque;
use std::future::Future;

use parking_lot::Mutex;

use super::error::PositionError;
use super::state::{DesiredAccuracy, PermissionStatus, UserPosition};
use crate::geo::GeoPoint;

/// Trait for talking to the platform location service.
///
/// Both async operations may fail or never resolve. Callers apply their own
/// timeout with `tokio::time::timeout`.
pub trait LocationService: Send + Sync {
    /// Current permission status without prompting the user.
    fn permission_status(&self) -> PermissionStatus;

    /// Prompt the user for foreground location access.
    ///
    /// Resolves to `Granted` or `Denied`.
    fn request_permission(
        &self,
    ) -> impl Future<Output = Result<PermissionStatus, PositionError>> + Send;

    /// Request a single fresh reading.
    fn current_reading(
        &self,
        accuracy: DesiredAccuracy,
    ) -> impl Future<Output = Result<UserPosition, PositionError>> + Send;
}

/// One scripted response to `current_reading`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedReading {
    /// Produce a device reading at this point with this accuracy radius.
    Reading(GeoPoint, f32),
    /// Fail with this error.
    Fail(PositionError),
    /// Never resolve.
    Hang,
}

#[derive(Debug)]
struct ScriptState {
    status: PermissionStatus,
    grant_on_request: bool,
    queue: VecDeque<ScriptedReading>,
    steady: Option<(GeoPoint, f32)>,
    reading_requests: usize,
}

/// In-memory location service driven by a script.
///
/// Queued readings are served first, in order; once the queue is empty the
/// steady reading (if any) is returned on every request.
#[derive(Debug)]
pub struct StaticLocationService {
    state: Mutex<ScriptState>,
}

impl Default for StaticLocationService {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticLocationService {
    /// Permission undetermined; a request will grant it.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScriptState {
                status: PermissionStatus::Undetermined,
                grant_on_request: true,
                queue: VecDeque::new(),
                steady: None,
                reading_requests: 0,
            }),
        }
    }

    /// Permission already granted, reporting a fixed location.
    pub fn granted_at(point: GeoPoint, accuracy_meters: f32) -> Self {
        let service = Self::new();
        {
            let mut state = service.state.lock();
            state.status = PermissionStatus::Granted;
            state.steady = Some((point, accuracy_meters));
        }
        service
    }

    /// Permission denied, and a request will be denied again.
    pub fn denied() -> Self {
        let service = Self::new();
        {
            let mut state = service.state.lock();
            state.status = PermissionStatus::Denied;
            state.grant_on_request = false;
        }
        service
    }

    /// Set what a permission prompt will answer.
    pub fn set_grant_on_request(&self, grant: bool) {
        self.state.lock().grant_on_request = grant;
    }

    /// Change the permission status directly (e.g. revoked in settings).
    pub fn set_permission(&self, status: PermissionStatus) {
        self.state.lock().status = status;
    }

    /// Change the steady reading.
    pub fn set_location(&self, point: GeoPoint, accuracy_meters: f32) {
        self.state.lock().steady = Some((point, accuracy_meters));
    }

    /// Queue a one-shot response.
    pub fn push(&self, reading: ScriptedReading) {
        self.state.lock().queue.push_back(reading);
    }

    /// How many readings have been requested so far.
    pub fn reading_requests(&self) -> usize {
        self.state.lock().reading_requests
    }

    fn next_response(&self) -> ScriptedReading {
        let mut state = self.state.lock();
        state.reading_requests += 1;

        if !state.status.is_granted() {
            return ScriptedReading::Fail(PositionError::PermissionDenied);
        }
        if let Some(next) = state.queue.pop_front() {
            return next;
        }
        match state.steady {
            Some((point, accuracy)) => ScriptedReading::Reading(point, accuracy),
            None => ScriptedReading::Fail(PositionError::Unavailable(
                "no location scripted".to_string(),
            )),
        }
    }
}

impl LocationService for StaticLocationService {
    fn permission_status(&self) -> PermissionStatus {
        self.state.lock().status
    }

    async fn request_permission(&self) -> Result<PermissionStatus, PositionError> {
        let mut state = self.state.lock();
        state.status = if state.grant_on_request {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        Ok(state.status)
    }

    async fn current_reading(
        &self,
        _accuracy: DesiredAccuracy,
    ) -> Result<UserPosition, PositionError> {
        match self.next_response() {
            ScriptedReading::Reading(point, accuracy) => {
                Ok(UserPosition::from_device(point, accuracy))
            }
            ScriptedReading::Fail(error) => Err(error),
            ScriptedReading::Hang => std::future::pending().await,
        }
    }
}
