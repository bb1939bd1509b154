//! # Fix Filtering
//!
//! Two gates sit between the raw fix stream and the route:
//!
//! 1. [`accuracy_ok`] rejects fixes whose reported horizontal accuracy is
//!    negative (the platform's "invalid" sentinel), too coarse, or whose
//!    coordinates are out of range. Rejected fixes never reach the motion
//!    history or the route.
//! 2. [`RouteFilter`] decides whether an accurate fix moved far enough from
//!    the last accepted route point to be worth appending (jitter floor), and
//!    optionally whether it moved implausibly far (teleport ceiling).

use crate::geo_utils::haversine_distance;
use crate::{GpsPoint, LocationFix, RecorderConfig};

/// Check the accuracy gate for a fix.
///
/// ```
/// use chrono::Utc;
/// use trip_recorder::{filter, LocationFix, RecorderConfig};
///
/// let config = RecorderConfig::default();
/// let now = Utc::now();
/// assert!(filter::accuracy_ok(&LocationFix::new(now, 35.0, 139.0, 5.0), &config));
/// assert!(!filter::accuracy_ok(&LocationFix::new(now, 35.0, 139.0, -1.0), &config));
/// assert!(!filter::accuracy_ok(&LocationFix::new(now, 35.0, 139.0, 999.0), &config));
/// ```
pub fn accuracy_ok(fix: &LocationFix, config: &RecorderConfig) -> bool {
    let accuracy = fix.horizontal_accuracy_meters;
    accuracy >= 0.0
        && accuracy <= config.min_accepted_accuracy_meters
        && fix.point().is_valid()
}

/// Outcome of offering a point to the [`RouteFilter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteDecision {
    /// Appended; it is now the last accepted point.
    Accepted,
    /// Closer than the jitter threshold to the last accepted point.
    Jitter { distance_meters: f64 },
    /// Farther than the teleport threshold from the last accepted point.
    Teleport { distance_meters: f64 },
}

impl RouteDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RouteDecision::Accepted)
    }
}

/// Distance-based route-append filter.
///
/// Tracks the last accepted route point. The teleport guard can be suspended
/// for a single offer with [`rearm`](Self::rearm), which the recorder does
/// after a resume: the user may legitimately have moved far from the last
/// accepted point while not recording.
#[derive(Debug, Clone, Default)]
pub struct RouteFilter {
    last_accepted: Option<GpsPoint>,
    skip_teleport_once: bool,
}

impl RouteFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_accepted(&self) -> Option<GpsPoint> {
        self.last_accepted
    }

    /// Decide without mutating.
    pub fn evaluate(&self, point: &GpsPoint, config: &RecorderConfig) -> RouteDecision {
        let Some(last) = self.last_accepted else {
            return RouteDecision::Accepted;
        };

        let distance_meters = haversine_distance(&last, point);
        if distance_meters < config.jitter_threshold_meters {
            return RouteDecision::Jitter { distance_meters };
        }

        if !self.skip_teleport_once {
            if let Some(teleport) = config.teleport_threshold_meters {
                if distance_meters > teleport {
                    return RouteDecision::Teleport { distance_meters };
                }
            }
        }

        RouteDecision::Accepted
    }

    /// Decide, and on acceptance make `point` the new last accepted point.
    pub fn offer(&mut self, point: GpsPoint, config: &RecorderConfig) -> RouteDecision {
        let decision = self.evaluate(&point, config);
        if decision.is_accepted() {
            self.last_accepted = Some(point);
            self.skip_teleport_once = false;
        }
        decision
    }

    /// Exempt the next accepted point from the teleport guard.
    pub fn rearm(&mut self) {
        self.skip_teleport_once = self.last_accepted.is_some();
    }

    /// Forget the last accepted point.
    pub fn reset(&mut self) {
        self.last_accepted = None;
        self.skip_teleport_once = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn fix(accuracy: f64) -> LocationFix {
        let t = Utc.with_ymd_and_hms(2026, 1, 8, 9, 0, 0).unwrap();
        LocationFix::new(t, 35.6895, 139.6917, accuracy)
    }

    #[test]
    fn test_accuracy_gate_bounds() {
        let config = RecorderConfig::default();
        assert!(accuracy_ok(&fix(0.0), &config));
        assert!(accuracy_ok(&fix(35.0), &config));
        assert!(!accuracy_ok(&fix(35.1), &config));
        assert!(!accuracy_ok(&fix(-1.0), &config));
        assert!(!accuracy_ok(&fix(999.0), &config));
        assert!(!accuracy_ok(&fix(f64::NAN), &config));
    }

    #[test]
    fn test_accuracy_gate_rejects_bad_coordinates() {
        let config = RecorderConfig::default();
        let mut bad = fix(5.0);
        bad.latitude = 95.0;
        assert!(!accuracy_ok(&bad, &config));
    }

    #[test]
    fn test_first_point_always_accepted() {
        let mut filter = RouteFilter::new();
        let config = RecorderConfig::default();
        assert_eq!(filter.offer(GpsPoint::new(0.0, 0.0), &config), RouteDecision::Accepted);
        assert_eq!(filter.last_accepted(), Some(GpsPoint::new(0.0, 0.0)));
    }

    #[test]
    fn test_jitter_rejected() {
        let mut filter = RouteFilter::new();
        let config = RecorderConfig::default();
        filter.offer(GpsPoint::new(0.0, 0.0), &config);

        // ~2.2m north
        let decision = filter.offer(GpsPoint::new(0.00002, 0.0), &config);
        assert!(matches!(decision, RouteDecision::Jitter { .. }));
        assert_eq!(filter.last_accepted(), Some(GpsPoint::new(0.0, 0.0)));

        // ~11m north
        assert!(filter.offer(GpsPoint::new(0.0001, 0.0), &config).is_accepted());
    }

    #[test]
    fn test_teleport_rejected_when_guard_enabled() {
        let mut filter = RouteFilter::new();
        let config = RecorderConfig::default();
        filter.offer(GpsPoint::new(0.0, 0.0), &config);

        // ~111m north
        let decision = filter.offer(GpsPoint::new(0.001, 0.0), &config);
        assert!(matches!(decision, RouteDecision::Teleport { .. }));
        assert_eq!(filter.last_accepted(), Some(GpsPoint::new(0.0, 0.0)));
    }

    #[test]
    fn test_teleport_allowed_when_guard_disabled() {
        let mut filter = RouteFilter::new();
        let config = RecorderConfig {
            teleport_threshold_meters: None,
            ..RecorderConfig::default()
        };
        filter.offer(GpsPoint::new(0.0, 0.0), &config);
        assert!(filter.offer(GpsPoint::new(0.001, 0.0), &config).is_accepted());
    }

    #[test]
    fn test_rearm_skips_teleport_once() {
        let mut filter = RouteFilter::new();
        let config = RecorderConfig::default();
        filter.offer(GpsPoint::new(0.0, 0.0), &config);

        filter.rearm();
        // Jitter floor still applies while rearmed
        assert!(matches!(
            filter.offer(GpsPoint::new(0.00001, 0.0), &config),
            RouteDecision::Jitter { .. }
        ));
        assert!(filter.offer(GpsPoint::new(0.001, 0.0), &config).is_accepted());
        // Guard is back on
        assert!(matches!(
            filter.offer(GpsPoint::new(0.002, 0.0), &config),
            RouteDecision::Teleport { .. }
        ));
    }

    #[test]
    fn test_reset_forgets_last_point() {
        let mut filter = RouteFilter::new();
        let config = RecorderConfig::default();
        filter.offer(GpsPoint::new(0.0, 0.0), &config);
        filter.reset();
        assert_eq!(filter.last_accepted(), None);
        assert!(filter.offer(GpsPoint::new(0.0, 0.0), &config).is_accepted());
    }
}
