//! Error types for the trip recorder.
//!
//! GPS noise (inaccurate fixes, jitter, implausible jumps) is the normal
//! operating condition and never surfaces here; those fixes are dropped by
//! the filter.

use thiserror::Error;

/// Errors surfaced by [`TripRecorder`](crate::TripRecorder) and the trip codec.
#[derive(Error, Debug)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error), uniffi(flat_error))]
pub enum RecorderError {
    /// Annotation attempted before any location fix was observed.
    #[error("No current location: no fix has been observed yet")]
    NoCurrentLocation,

    /// Operation requires an active recording session.
    #[error("Not recording")]
    NotRecording,

    #[error("Invalid recorder config: {0}")]
    InvalidConfig(String),

    #[error("Trip codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Recorder lock poisoned")]
    LockPoisoned,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RecorderError>;
