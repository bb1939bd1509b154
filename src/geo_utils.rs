//! # Geographic Utilities
//!
//! Geographic computations shared by the fix filter, the motion classifier
//! and the trip helpers.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`polyline_length`] | Total length of a GPS track in meters |
//! | [`compute_bounds`] | Bounding box of a GPS track |
//! | [`downsample`] | Stride-based thinning of a track for rendering |
//!
//! ## Example
//!
//! ```rust
//! use trip_recorder::{GpsPoint, geo_utils};
//!
//! let track = vec![
//!     GpsPoint::new(35.6895, 139.6917),  // Tokyo
//!     GpsPoint::new(35.6900, 139.6925),
//!     GpsPoint::new(35.6910, 139.6930),
//! ];
//!
//! let length = geo_utils::polyline_length(&track);
//! println!("Track length: {:.0}m", length);
//!
//! let dist = geo_utils::haversine_distance(&track[0], &track[2]);
//! println!("Start to end: {:.0}m", dist);
//! ```
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees).

use geo::{Point, Haversine, Distance};
use crate::{GpsPoint, Bounds};

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two GPS points using the Haversine formula.
///
/// Returns the distance in meters along the Earth's surface (spherical Earth,
/// radius 6,371 km). At these scales one ten-thousandth of a degree of
/// latitude is roughly 11.1 meters.
///
/// # Example
///
/// ```rust
/// use trip_recorder::{GpsPoint, geo_utils};
///
/// let origin = GpsPoint::new(0.0, 0.0);
/// let north = GpsPoint::new(0.0001, 0.0);
///
/// let distance = geo_utils::haversine_distance(&origin, &north);
/// assert!((distance - 11.1).abs() < 0.2);
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Calculate the total length of a polyline (GPS track) in meters.
///
/// Empty or single-point tracks return 0.0.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

// =============================================================================
// Bounding Box
// =============================================================================

/// Compute the bounding box of a GPS track.
///
/// Returns `None` for an empty track.
///
/// ```rust
/// use trip_recorder::{GpsPoint, geo_utils};
///
/// let track = vec![
///     GpsPoint::new(35.6800, 139.7600),
///     GpsPoint::new(35.6900, 139.7700),
///     GpsPoint::new(35.6850, 139.7650),
/// ];
///
/// let bounds = geo_utils::compute_bounds(&track).unwrap();
/// assert_eq!(bounds.min_lat, 35.6800);
/// assert_eq!(bounds.max_lng, 139.7700);
/// ```
pub fn compute_bounds(points: &[GpsPoint]) -> Option<Bounds> {
    if points.is_empty() {
        return None;
    }

    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lng = f64::MAX;
    let mut max_lng = f64::MIN;

    for p in points {
        min_lat = min_lat.min(p.latitude);
        max_lat = max_lat.max(p.latitude);
        min_lng = min_lng.min(p.longitude);
        max_lng = max_lng.max(p.longitude);
    }

    Some(Bounds { min_lat, max_lat, min_lng, max_lng })
}

// =============================================================================
// Rendering Helpers
// =============================================================================

/// Thin a track down to roughly `max_count` points by keeping every n-th point.
///
/// The stride is `len / max_count` (at least 1), so the result may hold
/// slightly more than `max_count` points. Tracks already within the limit,
/// and a `max_count` of zero, return the input unchanged.
///
/// ```rust
/// use trip_recorder::{GpsPoint, geo_utils};
///
/// let track: Vec<GpsPoint> = (0..10).map(|i| GpsPoint::new(i as f64, 0.0)).collect();
/// let thinned = geo_utils::downsample(&track, 5);
/// assert_eq!(thinned.len(), 5);
/// assert_eq!(thinned[1].latitude, 2.0);
/// ```
pub fn downsample(points: &[GpsPoint], max_count: usize) -> Vec<GpsPoint> {
    if max_count == 0 || points.len() <= max_count {
        return points.to_vec();
    }

    let stride = (points.len() / max_count).max(1);
    points
        .iter()
        .step_by(stride)
        .copied()
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
