//! # Trip Recorder
//!
//! The recording state machine. Consumes location fixes, grows a filtered
//! route while the user is moving, suppresses growth while they are
//! stationary, and collects photo/memo notes during the session.
//!
//! ## Lifecycle
//!
//! | Operation | Recording | Route / notes | History & auto-pause | Location updates |
//! |-----------|-----------|---------------|----------------------|------------------|
//! | `start(true)` | on | cleared | cleared | subscribed |
//! | `start(false)` | on | kept | cleared | subscribed |
//! | `pause()` | off | kept | cleared | kept |
//! | `resume()` | on | kept | cleared | subscribed |
//! | `stop()` | off | kept | cleared | unsubscribed |
//!
//! The recorder is not internally synchronized: every method takes `&mut self`.
//! Use [`SharedRecorder`](crate::SharedRecorder) to feed fixes from another
//! thread.
//!
//! ## Events
//!
//! Observers are called synchronously by default. A recorder living behind a
//! lock switches to [deferred delivery](TripRecorder::defer_events): events
//! queue up inside the recorder and the owner hands them out with
//! [`take_pending_events`](TripRecorder::take_pending_events) once the lock is
//! released, so an observer may call back into the shared handle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, trace, warn};
use uuid::Uuid;

use crate::filter::{self, RouteDecision, RouteFilter};
use crate::motion::{MotionDetector, MotionUpdate};
use crate::trip::{TravelNote, Trip};
use crate::{GpsPoint, LocationFix, RecorderConfig, RecorderError, Result, SensorCounters};

/// The platform location service, from the recorder's point of view.
///
/// The recorder only asks for updates to start or stop. Authorization is the
/// caller's business; a revoked permission simply means fixes stop arriving.
pub trait LocationSource: Send {
    fn start_updates(&mut self);
    fn stop_updates(&mut self);
}

/// State change notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    Started { reset: bool },
    Paused,
    Resumed,
    Stopped { route_points: usize },
    AutoPaused,
    AutoResumed,
    RoutePointAppended(GpsPoint),
    NoteAttached { id: Uuid, kind: crate::NoteKind },
}

/// Receives [`RecorderEvent`]s. Called from the recorder method that caused
/// the change, or after it returns when delivery is deferred.
pub trait RecorderObserver: Send + Sync {
    fn on_event(&self, event: &RecorderEvent);
}

/// Events queued by a deferred recorder, paired with the observers to tell.
#[must_use = "pending events are lost unless dispatched"]
pub struct PendingEvents {
    observers: Vec<Arc<dyn RecorderObserver>>,
    events: Vec<RecorderEvent>,
}

impl PendingEvents {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[RecorderEvent] {
        &self.events
    }

    /// Deliver every queued event, in order, to every observer.
    pub fn dispatch(self) {
        for event in &self.events {
            for observer in &self.observers {
                observer.on_event(event);
            }
        }
    }
}

/// A consistent copy of the recorder's observable state.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderSnapshot {
    pub is_recording: bool,
    pub is_auto_paused: bool,
    pub route: Vec<GpsPoint>,
    pub notes: Vec<TravelNote>,
    pub last_location: Option<LocationFix>,
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send>;

/// GPS trip recorder with auto-pause detection.
pub struct TripRecorder {
    config: RecorderConfig,
    is_recording: bool,
    /// Started and not yet stopped; a manual pause keeps the session open.
    session_open: bool,
    subscribed: bool,
    route: Vec<GpsPoint>,
    notes: Vec<TravelNote>,
    motion: MotionDetector,
    filter: RouteFilter,
    last_location: Option<LocationFix>,
    started_at: Option<DateTime<Utc>>,
    source: Option<Box<dyn LocationSource>>,
    observers: Vec<Arc<dyn RecorderObserver>>,
    defer_events: bool,
    pending: Vec<RecorderEvent>,
    clock: Clock,
}

impl std::fmt::Debug for TripRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripRecorder")
            .field("config", &self.config)
            .field("is_recording", &self.is_recording)
            .field("is_auto_paused", &self.motion.is_auto_paused())
            .field("route_points", &self.route.len())
            .field("notes", &self.notes.len())
            .finish_non_exhaustive()
    }
}

impl TripRecorder {
    /// Create a recorder. Fails if the config does not validate.
    pub fn new(config: RecorderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            is_recording: false,
            session_open: false,
            subscribed: false,
            route: Vec::new(),
            notes: Vec::new(),
            motion: MotionDetector::new(),
            filter: RouteFilter::new(),
            last_location: None,
            started_at: None,
            source: None,
            observers: Vec::new(),
            defer_events: false,
            pending: Vec::new(),
            clock: Box::new(Utc::now),
        })
    }

    /// Attach the location provider that start/resume/stop delegate to.
    pub fn with_location_source(mut self, source: Box<dyn LocationSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Replace the wall clock used for note timestamps and trip start/end.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn add_observer(&mut self, observer: Arc<dyn RecorderObserver>) {
        self.observers.push(observer);
    }

    /// Queue events instead of calling observers from inside `&mut self`
    /// methods. Needed whenever observers may lock the handle that owns this
    /// recorder.
    pub fn defer_events(&mut self) {
        self.defer_events = true;
    }

    /// Take the events queued since the last call. Empty unless
    /// [`defer_events`](Self::defer_events) was called.
    pub fn take_pending_events(&mut self) -> PendingEvents {
        PendingEvents {
            observers: if self.pending.is_empty() {
                Vec::new()
            } else {
                self.observers.clone()
            },
            events: std::mem::take(&mut self.pending),
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn is_auto_paused(&self) -> bool {
        self.motion.is_auto_paused()
    }

    pub fn route(&self) -> &[GpsPoint] {
        &self.route
    }

    pub fn notes(&self) -> &[TravelNote] {
        &self.notes
    }

    pub fn last_location(&self) -> Option<LocationFix> {
        self.last_location
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn snapshot(&self) -> RecorderSnapshot {
        RecorderSnapshot {
            is_recording: self.is_recording,
            is_auto_paused: self.motion.is_auto_paused(),
            route: self.route.clone(),
            notes: self.notes.clone(),
            last_location: self.last_location,
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Begin recording. With `reset`, clears the route, notes, motion history
    /// and last accepted point, and starts a new session clock. Without it,
    /// the route continues and the next point may be any distance from the
    /// last one.
    pub fn start(&mut self, reset: bool) {
        if reset {
            self.route.clear();
            self.notes.clear();
            self.filter.reset();
            self.started_at = Some((self.clock)());
        } else {
            if self.started_at.is_none() {
                self.started_at = Some((self.clock)());
            }
            self.filter.rearm();
        }
        self.motion.reset();
        self.is_recording = true;
        self.session_open = true;
        self.subscribe();

        info!("[TripRecorder] started (reset={}, route={} points)", reset, self.route.len());
        self.emit(RecorderEvent::Started { reset });
    }

    /// Manual pause. Route and notes are kept; auto-pause bookkeeping is dropped.
    pub fn pause(&mut self) {
        self.is_recording = false;
        self.motion.reset();

        info!("[TripRecorder] paused with {} points", self.route.len());
        self.emit(RecorderEvent::Paused);
    }

    pub fn resume(&mut self) {
        self.is_recording = true;
        self.session_open = true;
        self.motion.reset();
        self.filter.rearm();
        self.subscribe();

        info!("[TripRecorder] resumed");
        self.emit(RecorderEvent::Resumed);
    }

    /// Stop recording and return a copy of the route.
    ///
    /// The route buffer is kept until the next `start(true)`, so calling this
    /// twice returns the same route.
    pub fn stop(&mut self) -> Vec<GpsPoint> {
        let was_open = self.session_open;
        self.is_recording = false;
        self.session_open = false;
        self.motion.reset();
        self.unsubscribe();

        if was_open {
            info!("[TripRecorder] stopped with {} points, {} notes", self.route.len(), self.notes.len());
            self.emit(RecorderEvent::Stopped { route_points: self.route.len() });
        }
        self.route.clone()
    }

    /// Stop and package the session as a [`Trip`].
    ///
    /// Route and notes are deep-copied; counters are captured here, once.
    pub fn finish(&mut self, title: impl Into<String>, counters: SensorCounters) -> Trip {
        let route = self.stop();
        let ended_at = (self.clock)();
        let started_at = self.started_at.unwrap_or(ended_at);
        Trip::new(title, started_at, ended_at, route, self.notes.clone(), counters)
    }

    // ------------------------------------------------------------------------
    // Annotations
    // ------------------------------------------------------------------------

    /// Attach a memo at the last known location.
    ///
    /// Returns `Ok(None)` without recording anything when not recording.
    pub fn attach_memo(
        &mut self,
        text: impl Into<String>,
        counters: SensorCounters,
    ) -> Result<Option<TravelNote>> {
        if !self.is_recording {
            debug!("[TripRecorder] memo ignored: not recording");
            return Ok(None);
        }
        let fix = self.last_location.ok_or(RecorderError::NoCurrentLocation)?;
        let note = TravelNote::memo(fix.point(), (self.clock)(), counters, text);
        Ok(Some(self.push_note(note)))
    }

    /// Attach a photo by its storage reference at the last known location.
    ///
    /// Uploads finish asynchronously, so this may arrive after the session
    /// stopped. Such late references are dropped with a warning and
    /// `Ok(None)` is returned.
    pub fn attach_photo_ref(
        &mut self,
        photo_ref: impl Into<String>,
        counters: SensorCounters,
    ) -> Result<Option<TravelNote>> {
        let photo_ref = photo_ref.into();
        if !self.is_recording {
            if self.session_open {
                debug!("[TripRecorder] photo ignored: paused");
            } else {
                warn!("[TripRecorder] dropping late photo reference {}: session already stopped", photo_ref);
            }
            return Ok(None);
        }
        let fix = self.last_location.ok_or(RecorderError::NoCurrentLocation)?;
        let note = TravelNote::photo(fix.point(), (self.clock)(), counters, photo_ref);
        Ok(Some(self.push_note(note)))
    }

    fn push_note(&mut self, note: TravelNote) -> TravelNote {
        debug!("[TripRecorder] attached {:?} note {}", note.kind, note.id);
        self.notes.push(note.clone());
        self.emit(RecorderEvent::NoteAttached { id: note.id, kind: note.kind });
        note
    }

    // ------------------------------------------------------------------------
    // Fix ingestion
    // ------------------------------------------------------------------------

    /// Process one location fix.
    ///
    /// The last known location is updated regardless of recording state; route
    /// and motion logic only run while recording. Bad fixes are dropped
    /// silently.
    pub fn ingest(&mut self, fix: LocationFix) {
        if fix.point().is_valid() {
            self.last_location = Some(fix);
        }

        if !self.is_recording {
            return;
        }

        if !filter::accuracy_ok(&fix, &self.config) {
            trace!(
                "[TripRecorder] rejected fix with accuracy {:.1}m",
                fix.horizontal_accuracy_meters
            );
            return;
        }

        match self.motion.observe(&fix, &self.config) {
            MotionUpdate::OutOfOrder => {
                debug!("[TripRecorder] dropped out-of-order fix at {}", fix.timestamp);
                return;
            }
            MotionUpdate::AutoPaused => {
                info!("[TripRecorder] auto-paused: stationary for {}s", self.config.stationary_window_seconds);
                self.emit(RecorderEvent::AutoPaused);
            }
            MotionUpdate::AutoResumed => {
                // The resume fix only re-seeds the window; the route picks up
                // again from the next qualifying fix.
                info!("[TripRecorder] auto-resumed");
                self.filter.rearm();
                self.emit(RecorderEvent::AutoResumed);
                return;
            }
            MotionUpdate::Unchanged => {}
        }

        if self.motion.is_auto_paused() {
            return;
        }

        let point = fix.point();
        match self.filter.offer(point, &self.config) {
            RouteDecision::Accepted => {
                self.route.push(point);
                self.emit(RecorderEvent::RoutePointAppended(point));
            }
            RouteDecision::Jitter { distance_meters } => {
                trace!("[TripRecorder] jitter {:.1}m, not appended", distance_meters);
            }
            RouteDecision::Teleport { distance_meters } => {
                debug!("[TripRecorder] implausible jump {:.0}m, not appended", distance_meters);
            }
        }
    }

    fn subscribe(&mut self) {
        if self.subscribed {
            return;
        }
        if let Some(source) = self.source.as_mut() {
            source.start_updates();
        }
        self.subscribed = true;
    }

    fn unsubscribe(&mut self) {
        if !self.subscribed {
            return;
        }
        if let Some(source) = self.source.as_mut() {
            source.stop_updates();
        }
        self.subscribed = false;
    }

    fn emit(&mut self, event: RecorderEvent) {
        if self.defer_events {
            if !self.observers.is_empty() {
                self.pending.push(event);
            }
            return;
        }
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoteKind;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 8, 9, 0, 0).unwrap()
    }

    fn fix_at(seconds: i64, lat: f64, lng: f64) -> LocationFix {
        LocationFix::new(t0() + Duration::seconds(seconds), lat, lng, 5.0)
    }

    fn recorder() -> TripRecorder {
        TripRecorder::new(RecorderConfig::default())
            .unwrap()
            .with_clock(t0)
    }

    #[derive(Default)]
    struct CountingSource {
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
    }

    impl LocationSource for CountingSource {
        fn start_updates(&mut self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn stop_updates(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct EventLog(Mutex<Vec<RecorderEvent>>);

    impl RecorderObserver for EventLog {
        fn on_event(&self, event: &RecorderEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = RecorderConfig {
            resume_distance_meters: 5.0,
            ..RecorderConfig::default()
        };
        assert!(TripRecorder::new(config).is_err());
    }

    #[test]
    fn test_jitter_suppression() {
        let mut rec = recorder();
        rec.start(true);
        rec.ingest(fix_at(0, 0.0, 0.0));
        for s in 1..20 {
            // all within ~3m of the first point
            let lat = 0.00001 * (s % 3) as f64;
            rec.ingest(fix_at(s, lat, 0.0));
        }
        assert_eq!(rec.route().len(), 1);
    }

    #[test]
    fn test_ingest_ignored_while_not_recording() {
        let mut rec = recorder();
        rec.ingest(fix_at(0, 35.0, 139.0));
        assert!(rec.route().is_empty());
        assert_eq!(rec.last_location().map(|f| f.point()), Some(GpsPoint::new(35.0, 139.0)));
    }

    #[test]
    fn test_accuracy_filter_under_all_states() {
        let mut rec = recorder();
        rec.start(true);
        rec.ingest(fix_at(0, 0.0, 0.0));

        let mut bad = fix_at(1, 0.0002, 0.0);
        bad.horizontal_accuracy_meters = -1.0;
        rec.ingest(bad);
        bad.horizontal_accuracy_meters = 999.0;
        rec.ingest(bad);
        assert_eq!(rec.route().len(), 1);

        rec.pause();
        rec.ingest(bad);
        rec.resume();
        rec.ingest(bad);
        assert_eq!(rec.route().len(), 1);
    }

    #[test]
    fn test_auto_pause_blocks_route_growth() {
        let mut rec = recorder();
        rec.start(true);
        for s in 0..=90 {
            let lat = if s % 2 == 0 { 0.0 } else { 0.00002 };
            rec.ingest(fix_at(s, lat, 0.0));
        }
        assert!(rec.is_auto_paused());
        assert!(rec.is_recording());
        let before = rec.route().len();

        // ~8m moves stay inside the stationary radius but beat the jitter floor
        rec.ingest(fix_at(91, 0.00007, 0.0));
        rec.ingest(fix_at(92, 0.0, 0.0));
        assert!(rec.is_auto_paused());
        assert_eq!(rec.route().len(), before);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut rec = recorder();
        rec.start(true);
        rec.ingest(fix_at(0, 0.0, 0.0));
        rec.ingest(fix_at(1, 0.0001, 0.0));
        let first = rec.stop();
        let second = rec.stop();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert!(!rec.is_recording());
    }

    #[test]
    fn test_no_memo_while_paused() {
        let mut rec = recorder();
        rec.start(true);
        rec.ingest(fix_at(0, 0.0, 0.0));
        rec.pause();
        assert!(rec.attach_memo("ignored", SensorCounters::default()).unwrap().is_none());
        assert!(rec.notes().is_empty());
        rec.resume();
        assert!(rec.attach_memo("kept", SensorCounters::default()).unwrap().is_some());
        assert_eq!(rec.notes().len(), 1);
    }

    #[test]
    fn test_attach_without_location_fails() {
        let mut rec = recorder();
        rec.start(true);
        assert!(matches!(
            rec.attach_memo("hello", SensorCounters::default()),
            Err(RecorderError::NoCurrentLocation)
        ));
        assert!(matches!(
            rec.attach_photo_ref("users/u/photos/a/b.jpg", SensorCounters::default()),
            Err(RecorderError::NoCurrentLocation)
        ));
    }

    #[test]
    fn test_note_stamps_location_time_and_counters() {
        let mut rec = recorder();
        rec.start(true);
        rec.ingest(fix_at(0, 35.6895, 139.6917));
        let note = rec
            .attach_photo_ref("users/u/photos/t/n.jpg", SensorCounters::new(4200, 3100.5))
            .unwrap()
            .unwrap();
        assert_eq!(note.kind, NoteKind::Photo);
        assert_eq!(note.latitude, 35.6895);
        assert_eq!(note.longitude, 139.6917);
        assert_eq!(note.timestamp, t0());
        assert_eq!(note.steps, 4200);
        assert_eq!(note.distance_meters, 3100.5);
        assert_eq!(note.photo_ref.as_deref(), Some("users/u/photos/t/n.jpg"));
        assert!(note.text.is_none());
    }

    #[test]
    fn test_notes_allowed_while_auto_paused() {
        let mut rec = recorder();
        rec.start(true);
        for s in 0..=90 {
            rec.ingest(fix_at(s, 0.0, 0.0));
        }
        assert!(rec.is_auto_paused());
        assert!(rec.attach_memo("resting", SensorCounters::default()).unwrap().is_some());
    }

    #[test]
    fn test_late_photo_after_stop_is_dropped() {
        let mut rec = recorder();
        rec.start(true);
        rec.ingest(fix_at(0, 0.0, 0.0));
        let trip = rec.finish("Day out", SensorCounters::default());
        let late = rec
            .attach_photo_ref("users/u/photos/t/late.jpg", SensorCounters::default())
            .unwrap();
        assert!(late.is_none());
        assert!(rec.notes().is_empty());
        assert!(trip.notes.is_empty());
    }

    #[test]
    fn test_reset_semantics() {
        let mut rec = recorder();
        rec.start(true);
        rec.ingest(fix_at(0, 0.0, 0.0));
        rec.ingest(fix_at(1, 0.0001, 0.0));
        rec.attach_memo("first", SensorCounters::default()).unwrap();
        rec.stop();

        rec.start(false);
        assert_eq!(rec.route().len(), 2);
        assert_eq!(rec.notes().len(), 1);
        // Last accepted point survives too: a jitter fix is still rejected
        rec.ingest(fix_at(2, 0.0001, 0.0));
        assert_eq!(rec.route().len(), 2);
        rec.stop();

        rec.start(true);
        assert!(rec.route().is_empty());
        assert!(rec.notes().is_empty());
        rec.ingest(fix_at(3, 0.0001, 0.0));
        assert_eq!(rec.route().len(), 1);
    }

    #[test]
    fn test_accuracy_gate_keeps_bad_fixes_out_of_history() {
        let mut rec = recorder();
        rec.start(true);
        rec.ingest(fix_at(0, 0.0, 0.0));
        rec.ingest(fix_at(1, 0.0, 0.0));
        assert_eq!(rec.motion.history_len(), 2);

        let mut bad = fix_at(2, 0.0, 0.0);
        for accuracy in [-1.0, 999.0] {
            bad.horizontal_accuracy_meters = accuracy;
            rec.ingest(bad);
        }
        assert_eq!(rec.motion.history_len(), 2);

        for s in 2..=90 {
            rec.ingest(fix_at(s, 0.0, 0.0));
        }
        assert!(rec.is_auto_paused());
        let settled = rec.motion.history_len();

        // A bad fix far away must neither enter the window nor resume
        let mut far = fix_at(91, 0.001, 0.0);
        far.horizontal_accuracy_meters = 999.0;
        rec.ingest(far);
        assert_eq!(rec.motion.history_len(), settled);
        assert!(rec.is_auto_paused());
    }

    #[test]
    fn test_start_without_reset_exempts_next_point_from_teleport_guard() {
        let mut rec = recorder();
        rec.start(true);
        rec.ingest(fix_at(0, 0.0, 0.0));
        rec.stop();

        rec.start(false);
        // Picked back up ~1.1km away, then walking north in ~11m steps
        for i in 0..50 {
            rec.ingest(fix_at(600 + i, 0.01 + i as f64 * 0.0001, 0.0));
        }
        assert_eq!(rec.route().len(), 51);
        assert_eq!(rec.route()[1], GpsPoint::new(0.01, 0.0));
    }

    #[test]
    fn test_deferred_events_wait_for_dispatch() {
        let log = Arc::new(EventLog::default());
        let mut rec = recorder();
        rec.add_observer(log.clone());
        rec.defer_events();

        rec.start(true);
        rec.ingest(fix_at(0, 0.0, 0.0));
        assert!(log.0.lock().unwrap().is_empty());

        let pending = rec.take_pending_events();
        assert_eq!(pending.events().len(), 2);
        pending.dispatch();
        assert_eq!(
            *log.0.lock().unwrap(),
            vec![
                RecorderEvent::Started { reset: true },
                RecorderEvent::RoutePointAppended(GpsPoint::new(0.0, 0.0)),
            ]
        );
        assert!(rec.take_pending_events().is_empty());
    }

    #[test]
    fn test_deferred_events_without_observers_are_not_queued() {
        let mut rec = recorder();
        rec.defer_events();
        rec.start(true);
        rec.ingest(fix_at(0, 0.0, 0.0));
        assert!(rec.take_pending_events().is_empty());
    }

    #[test]
    fn test_resume_exempts_next_point_from_teleport_guard() {
        let mut rec = recorder();
        rec.start(true);
        rec.ingest(fix_at(0, 0.0, 0.0));
        rec.pause();
        rec.resume();
        // ~1.1km away after a manual pause
        rec.ingest(fix_at(600, 0.01, 0.0));
        assert_eq!(rec.route().len(), 2);
        // Guard is active again
        rec.ingest(fix_at(601, 0.02, 0.0));
        assert_eq!(rec.route().len(), 2);
    }

    #[test]
    fn test_location_source_subscription() {
        let source = CountingSource::default();
        let starts = source.starts.clone();
        let stops = source.stops.clone();
        let mut rec = recorder().with_location_source(Box::new(source));

        rec.start(true);
        rec.pause();
        rec.resume();
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        rec.stop();
        rec.stop();
        assert_eq!(stops.load(Ordering::SeqCst), 1);

        rec.resume();
        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_observer_events() {
        let log = Arc::new(EventLog::default());
        let mut rec = recorder();
        rec.add_observer(log.clone());

        rec.start(true);
        rec.ingest(fix_at(0, 0.0, 0.0));
        rec.attach_memo("hi", SensorCounters::default()).unwrap();
        rec.pause();
        rec.resume();
        rec.stop();
        rec.stop();

        let events = log.0.lock().unwrap().clone();
        assert_eq!(events.len(), 6);
        assert_eq!(events[0], RecorderEvent::Started { reset: true });
        assert_eq!(events[1], RecorderEvent::RoutePointAppended(GpsPoint::new(0.0, 0.0)));
        assert!(matches!(events[2], RecorderEvent::NoteAttached { kind: NoteKind::Memo, .. }));
        assert_eq!(events[3], RecorderEvent::Paused);
        assert_eq!(events[4], RecorderEvent::Resumed);
        assert_eq!(events[5], RecorderEvent::Stopped { route_points: 1 });
    }

    #[test]
    fn test_finish_packages_trip() {
        let mut rec = recorder();
        rec.start(true);
        rec.ingest(fix_at(0, 0.0, 0.0));
        rec.ingest(fix_at(1, 0.0001, 0.0));
        rec.attach_memo("lunch", SensorCounters::new(100, 80.0)).unwrap();

        let trip = rec.finish("Kyoto", SensorCounters::new(5000, 3500.0));
        assert_eq!(trip.title, "Kyoto");
        assert_eq!(trip.route.len(), 2);
        assert_eq!(trip.notes.len(), 1);
        assert_eq!(trip.steps, 5000);
        assert_eq!(trip.distance_meters, 3500.0);
        assert_eq!(trip.started_at, t0());
        assert!(!rec.is_recording());

        // The trip is a copy: restarting does not touch it
        rec.start(true);
        assert_eq!(trip.route.len(), 2);
    }

    #[test]
    fn test_snapshot_is_consistent() {
        let mut rec = recorder();
        rec.start(true);
        rec.ingest(fix_at(0, 0.0, 0.0));
        let snapshot = rec.snapshot();
        assert!(snapshot.is_recording);
        assert!(!snapshot.is_auto_paused);
        assert_eq!(snapshot.route, rec.route());
        assert_eq!(snapshot.last_location, Some(fix_at(0, 0.0, 0.0)));
    }
}
