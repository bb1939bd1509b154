//! # Trip Recorder
//!
//! GPS trip recording core for travel-journaling apps.
//!
//! This library provides:
//! - A recording state machine that turns a noisy location-fix stream into a clean route
//! - Automatic pause/resume detection when the user stops moving
//! - Geotagged photo/memo annotations stamped with step and distance counters
//! - A finalized, JSON-encodable [`Trip`] record for the persistence layer
//!
//! ## Features
//!
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`async`** - Drive a shared recorder from a tokio channel
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use trip_recorder::{LocationFix, RecorderConfig, SensorCounters, TripRecorder};
//!
//! let mut recorder = TripRecorder::new(RecorderConfig::default()).unwrap();
//! recorder.start(true);
//!
//! let t0 = Utc.with_ymd_and_hms(2026, 1, 8, 9, 0, 0).unwrap();
//! recorder.ingest(LocationFix::new(t0, 35.6895, 139.6917, 5.0));
//!
//! recorder.attach_memo("Coffee stop", SensorCounters::new(1200, 850.0)).unwrap();
//!
//! let trip = recorder.finish("Morning walk", SensorCounters::new(1500, 1100.0));
//! assert_eq!(trip.route.len(), 1);
//! assert_eq!(trip.notes.len(), 1);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{RecorderError, Result};

pub mod geo_utils;

// Accuracy gate and route-append filter
pub mod filter;
pub use filter::{RouteDecision, RouteFilter};

// Stationary-window motion classification
pub mod motion;
pub use motion::{MotionDetector, MotionUpdate};

// Recording state machine
pub mod recorder;
pub use recorder::{
    LocationSource, PendingEvents, RecorderEvent, RecorderObserver, RecorderSnapshot,
    TripRecorder,
};

// Finalized trip records
pub mod trip;
pub use trip::{
    photo_storage_path, sort_trips_newest_first, NoteKind, TravelNote, Trip, TripSummary,
};

// Serialized cross-thread access
pub mod shared;
pub use shared::{FixPump, SharedRecorder};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("TripRecorderRust")
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use trip_recorder::GpsPoint;
/// let point = GpsPoint::new(35.6895, 139.6917); // Tokyo
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box for a route.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// One raw position reading from the location provider.
///
/// A negative `horizontal_accuracy_meters` is the platform's sentinel for
/// "no valid accuracy"; very large values mean a low-quality fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub horizontal_accuracy_meters: f64,
}

impl LocationFix {
    pub fn new(
        timestamp: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
        horizontal_accuracy_meters: f64,
    ) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            horizontal_accuracy_meters,
        }
    }

    /// Build a fix from a Unix timestamp in milliseconds.
    ///
    /// Returns `None` if the timestamp is out of range.
    pub fn from_unix_millis(
        timestamp_ms: i64,
        latitude: f64,
        longitude: f64,
        horizontal_accuracy_meters: f64,
    ) -> Option<Self> {
        let timestamp = DateTime::from_timestamp_millis(timestamp_ms)?;
        Some(Self::new(timestamp, latitude, longitude, horizontal_accuracy_meters))
    }

    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// Step and distance counters from the pedometer feed.
///
/// The recorder never interprets these; it stamps them onto notes and the
/// finalized trip at the moment of creation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct SensorCounters {
    pub steps: u32,
    pub distance_meters: f64,
}

impl SensorCounters {
    pub fn new(steps: u32, distance_meters: f64) -> Self {
        Self { steps, distance_meters }
    }
}

/// Configuration for fix filtering and auto-pause detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct RecorderConfig {
    /// Fixes with accuracy below zero or above this are discarded entirely.
    /// Default: 35.0 meters
    pub min_accepted_accuracy_meters: f64,

    /// Minimum movement since the last accepted point to append a new route point.
    /// Default: 5.0 meters
    pub jitter_threshold_meters: f64,

    /// Maximum plausible movement since the last accepted point; larger jumps are
    /// discarded as GPS glitches. `None` disables the guard.
    /// Default: Some(80.0) meters
    pub teleport_threshold_meters: Option<f64>,

    /// How long the fix history must span, all within the radius, to declare "stopped".
    /// Default: 90.0 seconds
    pub stationary_window_seconds: f64,

    /// Max deviation from the window's first fix that still counts as stationary.
    /// Default: 10.0 meters
    pub stationary_radius_meters: f64,

    /// Distance from the window's first fix needed to declare "moving again".
    /// Must exceed `stationary_radius_meters`. Default: 15.0 meters
    pub resume_distance_meters: f64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            min_accepted_accuracy_meters: 35.0,
            jitter_threshold_meters: 5.0,
            teleport_threshold_meters: Some(80.0),
            stationary_window_seconds: 90.0,
            stationary_radius_meters: 10.0,
            resume_distance_meters: 15.0,
        }
    }
}

impl RecorderConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    ///
    /// ```
    /// use trip_recorder::RecorderConfig;
    ///
    /// let config = RecorderConfig::from_json(r#"{"stationary_window_seconds": 60.0}"#).unwrap();
    /// assert_eq!(config.stationary_window_seconds, 60.0);
    /// assert_eq!(config.jitter_threshold_meters, 5.0);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Longest accepted `stationary_window_seconds` (one day).
    pub const MAX_STATIONARY_WINDOW_SECONDS: f64 = 86_400.0;

    /// Check that thresholds are positive and the resume/stationary hysteresis is ordered.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("min_accepted_accuracy_meters", self.min_accepted_accuracy_meters),
            ("jitter_threshold_meters", self.jitter_threshold_meters),
            ("stationary_window_seconds", self.stationary_window_seconds),
            ("stationary_radius_meters", self.stationary_radius_meters),
            ("resume_distance_meters", self.resume_distance_meters),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(RecorderError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if self.stationary_window_seconds > Self::MAX_STATIONARY_WINDOW_SECONDS {
            return Err(RecorderError::InvalidConfig(format!(
                "stationary_window_seconds ({}) must not exceed {}",
                self.stationary_window_seconds,
                Self::MAX_STATIONARY_WINDOW_SECONDS
            )));
        }

        if let Some(teleport) = self.teleport_threshold_meters {
            if !teleport.is_finite() || teleport <= self.jitter_threshold_meters {
                return Err(RecorderError::InvalidConfig(format!(
                    "teleport_threshold_meters ({}) must exceed jitter_threshold_meters ({})",
                    teleport, self.jitter_threshold_meters
                )));
            }
        }

        if self.resume_distance_meters <= self.stationary_radius_meters {
            return Err(RecorderError::InvalidConfig(format!(
                "resume_distance_meters ({}) must exceed stationary_radius_meters ({})",
                self.resume_distance_meters, self.stationary_radius_meters
            )));
        }

        Ok(())
    }

    pub(crate) fn stationary_window(&self) -> chrono::Duration {
        let millis = (self.stationary_window_seconds * 1000.0).round() as i64;
        chrono::Duration::try_milliseconds(millis).unwrap_or(chrono::Duration::MAX)
    }
}

// ============================================================================
// FFI Exports (only when feature enabled)
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::{info, warn};
    use std::sync::Arc;

    /// Callback interface for recorder state changes.
    /// Implement this in Kotlin/Swift to drive UI updates.
    #[uniffi::export(callback_interface)]
    pub trait RecorderEventCallback: Send + Sync {
        fn on_event(&self, event: FfiRecorderEvent);
    }

    /// Recorder events flattened for the mobile side.
    #[derive(Debug, Clone, uniffi::Enum)]
    pub enum FfiRecorderEvent {
        Started { reset: bool },
        Paused,
        Resumed,
        Stopped { route_points: u32 },
        AutoPaused,
        AutoResumed,
        RoutePointAppended { point: GpsPoint },
        NoteAttached { note_id: String, kind: NoteKind },
    }

    impl From<&RecorderEvent> for FfiRecorderEvent {
        fn from(event: &RecorderEvent) -> Self {
            match event {
                RecorderEvent::Started { reset } => Self::Started { reset: *reset },
                RecorderEvent::Paused => Self::Paused,
                RecorderEvent::Resumed => Self::Resumed,
                RecorderEvent::Stopped { route_points } => Self::Stopped {
                    route_points: saturating_u32(*route_points),
                },
                RecorderEvent::AutoPaused => Self::AutoPaused,
                RecorderEvent::AutoResumed => Self::AutoResumed,
                RecorderEvent::RoutePointAppended(point) => {
                    Self::RoutePointAppended { point: *point }
                }
                RecorderEvent::NoteAttached { id, kind } => Self::NoteAttached {
                    note_id: id.to_string(),
                    kind: *kind,
                },
            }
        }
    }

    fn saturating_u32(n: usize) -> u32 {
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    struct CallbackObserver(Box<dyn RecorderEventCallback>);

    impl RecorderObserver for CallbackObserver {
        fn on_event(&self, event: &RecorderEvent) {
            self.0.on_event(event.into());
        }
    }

    /// Location fix with a millisecond timestamp (JS/Kotlin/Swift friendly).
    #[derive(Debug, Clone, uniffi::Record)]
    pub struct FfiLocationFix {
        pub timestamp_ms: i64,
        pub latitude: f64,
        pub longitude: f64,
        pub horizontal_accuracy_meters: f64,
    }

    #[derive(Debug, Clone, uniffi::Record)]
    pub struct FfiRecorderSnapshot {
        pub is_recording: bool,
        pub is_auto_paused: bool,
        pub route: Vec<GpsPoint>,
        pub note_count: u32,
        pub last_location: Option<GpsPoint>,
    }

    /// Thread-safe recorder handle owned by the mobile app.
    ///
    /// Event callbacks fire after the handle's lock is released, so a
    /// callback may query `snapshot()`.
    #[derive(uniffi::Object)]
    pub struct TripRecorderHandle {
        inner: SharedRecorder,
    }

    #[uniffi::export]
    impl TripRecorderHandle {
        #[uniffi::constructor]
        pub fn new(config: RecorderConfig) -> std::result::Result<Arc<Self>, RecorderError> {
            init_logging();
            info!("[TripRecorderRust] creating recorder with {:?}", config);
            let recorder = TripRecorder::new(config)?;
            Ok(Arc::new(Self { inner: SharedRecorder::new(recorder) }))
        }

        pub fn set_event_callback(&self, callback: Box<dyn RecorderEventCallback>) -> std::result::Result<(), RecorderError> {
            self.inner.with(|r| r.add_observer(Arc::new(CallbackObserver(callback))))
        }

        pub fn start(&self, reset: bool) -> std::result::Result<(), RecorderError> {
            self.inner.start(reset)
        }

        pub fn pause(&self) -> std::result::Result<(), RecorderError> {
            self.inner.pause()
        }

        pub fn resume(&self) -> std::result::Result<(), RecorderError> {
            self.inner.resume()
        }

        pub fn stop(&self) -> std::result::Result<Vec<GpsPoint>, RecorderError> {
            self.inner.stop()
        }

        pub fn ingest(&self, fix: FfiLocationFix) -> std::result::Result<(), RecorderError> {
            let Some(fix) = LocationFix::from_unix_millis(
                fix.timestamp_ms,
                fix.latitude,
                fix.longitude,
                fix.horizontal_accuracy_meters,
            ) else {
                warn!("[TripRecorderRust] dropping fix with out-of-range timestamp {}", fix.timestamp_ms);
                return Ok(());
            };
            self.inner.ingest(fix)
        }

        /// Returns the new note's ID, or `None` when not recording.
        pub fn attach_memo(&self, text: String, counters: SensorCounters) -> std::result::Result<Option<String>, RecorderError> {
            let note = self.inner.attach_memo(text, counters)?;
            Ok(note.map(|n| n.id.to_string()))
        }

        /// Returns the new note's ID, or `None` when not recording.
        pub fn attach_photo_ref(&self, photo_ref: String, counters: SensorCounters) -> std::result::Result<Option<String>, RecorderError> {
            let note = self.inner.attach_photo_ref(photo_ref, counters)?;
            Ok(note.map(|n| n.id.to_string()))
        }

        /// Stop and return the finalized trip as JSON for the persistence layer.
        pub fn finish(&self, title: String, counters: SensorCounters) -> std::result::Result<String, RecorderError> {
            let trip = self.inner.finish(title, counters)?;
            info!("[TripRecorderRust] finished trip {}: {} points, {} notes", trip.id, trip.route.len(), trip.notes.len());
            trip.to_json()
        }

        pub fn snapshot(&self) -> std::result::Result<FfiRecorderSnapshot, RecorderError> {
            let snapshot = self.inner.snapshot()?;
            Ok(FfiRecorderSnapshot {
                is_recording: snapshot.is_recording,
                is_auto_paused: snapshot.is_auto_paused,
                route: snapshot.route,
                note_count: saturating_u32(snapshot.notes.len()),
                last_location: snapshot.last_location.map(|f| f.point()),
            })
        }
    }

    /// Get default configuration.
    #[uniffi::export]
    pub fn default_recorder_config() -> RecorderConfig {
        init_logging();
        info!("[TripRecorderRust] default_recorder_config called - Rust is active!");
        RecorderConfig::default()
    }

    /// Storage path for a photo upload, keyed by trip and note.
    #[uniffi::export]
    pub fn ffi_photo_storage_path(uid: String, trip_id: String, note_id: String) -> String {
        crate::trip::format_photo_path(&uid, &trip_id, &note_id)
    }

}

// ============================================================================
// Tests
// ============================================================================
