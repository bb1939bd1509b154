//! # Motion Classification
//!
//! Decides when the user has stopped moving and when they have started
//! again, from a sliding time window of accurate fixes.
//!
//! ## Algorithm
//!
//! Each accepted fix is appended to a time-ordered history; entries older
//! than `now - stationary_window` are trimmed from the front. With at least
//! three entries, let `base` be the oldest entry:
//!
//! - **Stop**: the window spans the full `stationary_window` and every entry
//!   lies within `stationary_radius` of `base`.
//! - **Resume**: while auto-paused, the newest fix lies at least
//!   `resume_distance` from `base`. History is then reset to just that fix so
//!   stale stationary data cannot immediately re-trigger a stop.
//!
//! `resume_distance > stationary_radius` gives the two states hysteresis: a
//! fix wobbling around the radius boundary cannot flip the state back and
//! forth.

use std::collections::VecDeque;

use crate::geo_utils::haversine_distance;
use crate::{GpsPoint, LocationFix, RecorderConfig};

/// Minimum history length before the classifier evaluates anything.
const MIN_HISTORY: usize = 3;

#[derive(Debug, Clone, Copy)]
struct TimedPoint {
    timestamp: chrono::DateTime<chrono::Utc>,
    point: GpsPoint,
}

/// What a single observation did to the motion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionUpdate {
    /// No transition.
    Unchanged,
    /// Transitioned moving -> stationary.
    AutoPaused,
    /// Transitioned stationary -> moving.
    AutoResumed,
    /// Timestamp precedes the newest history entry; ignored.
    OutOfOrder,
}

/// Sliding-window stationary detector.
#[derive(Debug, Clone, Default)]
pub struct MotionDetector {
    history: VecDeque<TimedPoint>,
    auto_paused: bool,
}

impl MotionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_auto_paused(&self) -> bool {
        self.auto_paused
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Clear the history window and the auto-pause flag.
    pub fn reset(&mut self) {
        self.history.clear();
        self.auto_paused = false;
    }

    /// Feed one accurate fix through the classifier.
    ///
    /// The caller is responsible for the accuracy gate.
    pub fn observe(&mut self, fix: &LocationFix, config: &RecorderConfig) -> MotionUpdate {
        if let Some(newest) = self.history.back() {
            if fix.timestamp < newest.timestamp {
                return MotionUpdate::OutOfOrder;
            }
        }

        let current = TimedPoint {
            timestamp: fix.timestamp,
            point: fix.point(),
        };
        self.history.push_back(current);

        let window = config.stationary_window();
        // A window reaching before the representable range trims nothing.
        if let Some(cutoff) = fix.timestamp.checked_sub_signed(window) {
            while self.history.front().is_some_and(|p| p.timestamp < cutoff) {
                self.history.pop_front();
            }
        }

        if self.history.len() < MIN_HISTORY {
            return MotionUpdate::Unchanged;
        }

        let base = self.history[0];
        let max_deviation = self
            .history
            .iter()
            .map(|p| haversine_distance(&base.point, &p.point))
            .fold(0.0, f64::max);
        let window_span = current.timestamp - base.timestamp;

        if window_span >= window && max_deviation <= config.stationary_radius_meters {
            if self.auto_paused {
                return MotionUpdate::Unchanged;
            }
            self.auto_paused = true;
            return MotionUpdate::AutoPaused;
        }

        if self.auto_paused
            && haversine_distance(&current.point, &base.point) >= config.resume_distance_meters
        {
            self.auto_paused = false;
            self.history.clear();
            self.history.push_back(current);
            return MotionUpdate::AutoResumed;
        }

        MotionUpdate::Unchanged
    }
}
