//! Position Model - keeps the most recent reading.
//!
//! # Selection Logic
//!
//! A reading replaces the current one only if its timestamp is strictly
//! later. Equal or older timestamps are rejected, so replaying or
//! reordering platform callbacks can never move the user backwards.

use super::state::UserPosition;

/// Keeps the latest accepted [`UserPosition`].
#[derive(Debug, Default)]
pub struct PositionModel {
    /// Current reading (None before the first reading or after a clear).
    current: Option<UserPosition>,
}

impl PositionModel {
    /// Create a new empty position model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current reading (if any).
    pub fn current(&self) -> Option<&UserPosition> {
        self.current.as_ref()
    }

    /// Check if we have a reading.
    pub fn has_position(&self) -> bool {
        self.current.is_some()
    }

    /// Determine if a reading should replace the current one.
    pub fn should_accept(&self, update: &UserPosition) -> bool {
        let Some(current) = &self.current else {
            return true;
        };
        update.timestamp > current.timestamp
    }

    /// Apply a reading to the model.
    ///
    /// Returns true if the reading was accepted.
    pub fn apply_update(&mut self, update: UserPosition) -> bool {
        if self.should_accept(&update) {
            self.current = Some(update);
            true
        } else {
            false
        }
    }

    /// Forget the current reading.
    ///
    /// Returns true if there was one.
    pub fn clear(&mut self) -> bool {
        self.current.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use std::time::{Duration, Instant};

    fn reading(lat: f64, at: Instant) -> UserPosition {
        UserPosition::from_device(GeoPoint::new(lat, -122.3493).unwrap(), 5.0).at(at)
    }

    #[test]
    fn test_empty_model_accepts_anything() {
        let mut model = PositionModel::new();
        assert!(!model.has_position());
        assert!(model.apply_update(reading(47.62, Instant::now())));
        assert!(model.has_position());
    }

    #[test]
    fn test_later_reading_supersedes() {
        let t0 = Instant::now();
        let mut model = PositionModel::new();
        model.apply_update(reading(47.62, t0));

        assert!(model.apply_update(reading(47.63, t0 + Duration::from_secs(1))));
        assert_eq!(model.current().unwrap().point.latitude(), 47.63);
    }

    #[test]
    fn test_older_or_equal_reading_rejected() {
        let t0 = Instant::now() + Duration::from_secs(10);
        let mut model = PositionModel::new();
        model.apply_update(reading(47.62, t0));

        assert!(
            !model.apply_update(reading(47.50, t0)),
            "Equal timestamp must not replace the current reading"
        );
        assert!(
            !model.apply_update(reading(47.50, t0 - Duration::from_secs(5))),
            "Older timestamp must not replace the current reading"
        );
        assert_eq!(model.current().unwrap().point.latitude(), 47.62);
    }

    #[test]
    fn test_clear_forgets_reading() {
        let mut model = PositionModel::new();
        model.apply_update(reading(47.62, Instant::now()));

        assert!(model.clear());
        assert!(!model.has_position());
        assert!(!model.clear(), "Second clear has nothing to forget");
    }
}
