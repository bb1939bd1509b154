//! Simulated walk through the trip recorder.
//!
//! Run with: cargo run --example record_trip

use chrono::{Duration, Utc};
use trip_recorder::{LocationFix, RecorderConfig, SensorCounters, TripRecorder};

fn main() {
    let config = RecorderConfig::default();
    let mut recorder = TripRecorder::new(config.clone()).expect("default config is valid");

    println!("Trip Recorder Example\n");
    println!(
        "Config: jitter={}m, window={}s, radius={}m, resume={}m\n",
        config.jitter_threshold_meters,
        config.stationary_window_seconds,
        config.stationary_radius_meters,
        config.resume_distance_meters
    );

    let start = Utc::now();
    let fix = |seconds: i64, lat: f64, lng: f64, accuracy: f64| {
        LocationFix::new(start + Duration::seconds(seconds), lat, lng, accuracy)
    };

    recorder.start(true);

    // 1. Walk north along Kamogawa, ~11m per fix
    println!("1. Walking for 60 seconds");
    for s in 0..60 {
        recorder.ingest(fix(s, 35.0050 + s as f64 * 0.0001, 135.7720, 5.0));
    }
    println!("   Route: {} points\n", recorder.route().len());

    // 2. A bad fix in the middle of it all
    println!("2. Low-accuracy fix (999m)");
    recorder.ingest(fix(60, 35.2, 135.9, 999.0));
    println!("   Route: {} points (unchanged)\n", recorder.route().len());

    // 3. Sit down at a cafe
    println!("3. Sitting at a cafe for two minutes");
    let cafe = (35.0050 + 59.0 * 0.0001, 135.7720);
    for s in 61..180 {
        let wobble = if s % 2 == 0 { 0.0 } else { 0.00002 };
        recorder.ingest(fix(s, cafe.0 + wobble, cafe.1, 8.0));
    }
    println!("   Auto-paused: {}", recorder.is_auto_paused());
    match recorder.attach_memo("Matcha latte", SensorCounters::new(1800, 700.0)) {
        Ok(Some(note)) => println!("   Memo {} at ({:.5}, {:.5})\n", note.id, note.latitude, note.longitude),
        Ok(None) => println!("   Memo ignored\n"),
        Err(e) => println!("   Memo failed: {}\n", e),
    }

    // 4. Leave the cafe
    println!("4. Walking on");
    for s in 180..200 {
        recorder.ingest(fix(s, cafe.0 + (s - 179) as f64 * 0.0002, cafe.1, 5.0));
    }
    println!("   Auto-paused: {}", recorder.is_auto_paused());

    let trip = recorder.finish("Kyoto afternoon", SensorCounters::new(2600, 1150.0));
    println!("\n{}", trip);
    println!("Route length: {:.0}m", trip.route_length_meters());
}
