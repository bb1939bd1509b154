//! Serialized access to a [`TripRecorder`] from several threads.
//!
//! Location fixes arrive on the platform's callback thread while lifecycle
//! calls come from UI code. Both go through the same lock here, so a fix can
//! never land in the route after `stop()` has captured it.
//!
//! Observer callbacks run after the lock is released, so an observer may call
//! back into the same handle (typically `snapshot()`). Events raised by
//! concurrent calls from different threads may reach observers interleaved.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

use crate::{
    GpsPoint, LocationFix, RecorderError, RecorderSnapshot, Result, SensorCounters, TravelNote,
    Trip, TripRecorder,
};

/// Cloneable, thread-safe handle to one recorder.
#[derive(Clone)]
pub struct SharedRecorder {
    inner: Arc<Mutex<TripRecorder>>,
}

impl SharedRecorder {
    /// Wrap `recorder`, switching it to deferred event delivery.
    pub fn new(mut recorder: TripRecorder) -> Self {
        recorder.defer_events();
        Self {
            inner: Arc::new(Mutex::new(recorder)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, TripRecorder>> {
        self.inner.lock().map_err(|_| RecorderError::LockPoisoned)
    }

    /// Run `f` with exclusive access to the recorder, then notify observers
    /// of whatever it raised once the lock is released.
    pub fn with<R>(&self, f: impl FnOnce(&mut TripRecorder) -> R) -> Result<R> {
        let (result, pending) = {
            let mut recorder = self.lock()?;
            let result = f(&mut recorder);
            (result, recorder.take_pending_events())
        };
        pending.dispatch();
        Ok(result)
    }

    pub fn start(&self, reset: bool) -> Result<()> {
        self.with(|r| r.start(reset))
    }

    pub fn pause(&self) -> Result<()> {
        self.with(|r| r.pause())
    }

    pub fn resume(&self) -> Result<()> {
        self.with(|r| r.resume())
    }

    pub fn stop(&self) -> Result<Vec<GpsPoint>> {
        self.with(|r| r.stop())
    }

    pub fn finish(&self, title: impl Into<String>, counters: SensorCounters) -> Result<Trip> {
        self.with(|r| r.finish(title, counters))
    }

    pub fn ingest(&self, fix: LocationFix) -> Result<()> {
        self.with(|r| r.ingest(fix))
    }

    pub fn attach_memo(&self, text: impl Into<String>, counters: SensorCounters) -> Result<Option<TravelNote>> {
        self.with(|r| r.attach_memo(text, counters))?
    }

    pub fn attach_photo_ref(&self, photo_ref: impl Into<String>, counters: SensorCounters) -> Result<Option<TravelNote>> {
        self.with(|r| r.attach_photo_ref(photo_ref, counters))?
    }

    pub fn snapshot(&self) -> Result<RecorderSnapshot> {
        self.with(|r| r.snapshot())
    }

    /// Create a fix channel. The sender goes to the location callback; the
    /// pump feeds queued fixes into this recorder.
    pub fn fix_channel(&self) -> (Sender<LocationFix>, FixPump) {
        let (tx, rx) = mpsc::channel();
        (tx, FixPump { recorder: self.clone(), rx })
    }

    /// Ingest fixes from a tokio channel on a background task until every
    /// sender is dropped.
    #[cfg(feature = "async")]
    pub fn spawn_ingest(
        &self,
        mut rx: tokio::sync::mpsc::Receiver<LocationFix>,
    ) -> tokio::task::JoinHandle<()> {
        let recorder = self.clone();
        tokio::spawn(async move {
            let mut count = 0usize;
            while let Some(fix) = rx.recv().await {
                if let Err(e) = recorder.ingest(fix) {
                    log::warn!("[SharedRecorder] ingest task stopping: {}", e);
                    break;
                }
                count += 1;
            }
            debug!("[SharedRecorder] ingest task finished after {} fixes", count);
        })
    }
}

/// Receiving end of [`SharedRecorder::fix_channel`].
pub struct FixPump {
    recorder: SharedRecorder,
    rx: Receiver<LocationFix>,
}

impl FixPump {
    /// Ingest every fix queued so far under a single lock acquisition.
    /// Returns how many were processed.
    pub fn drain(&self) -> Result<usize> {
        self.recorder.with(|recorder| {
            let mut count = 0;
            for fix in self.rx.try_iter() {
                recorder.ingest(fix);
                count += 1;
            }
            count
        })
    }

    /// Block, ingesting fixes as they arrive, until every sender is dropped.
    /// Intended for a dedicated thread.
    pub fn run(self) -> Result<usize> {
        let mut count = 0;
        for fix in self.rx.iter() {
            self.recorder.ingest(fix)?;
            count += 1;
        }
        debug!("[FixPump] channel closed after {} fixes", count);
        Ok(count)
    }
}
