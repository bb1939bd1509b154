//! Finalized trip records and their storage encoding.
//!
//! A [`Trip`] is produced once per recording session and handed to the
//! persistence layer. The JSON shape uses camelCase keys. The route is written
//! as a flat `[lat, lon, lat, lon, ...]` array, which document stores accept,
//! and is read back from either that flat form or the older nested
//! `[[lat, lon], ...]` form.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo_utils::{compute_bounds, downsample, polyline_length};
use crate::{Bounds, GpsPoint, Result, SensorCounters};

/// Kind of user annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum NoteKind {
    Photo,
    Memo,
}

/// A geotagged photo or memo attached during a recording session.
///
/// Exactly one of `text` (memo) and `photo_ref` (photo) is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelNote {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NoteKind,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    /// Trip step count when the note was created
    #[serde(default)]
    pub steps: u32,
    /// Trip distance when the note was created
    #[serde(default)]
    pub distance_meters: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Opaque storage reference returned by the photo upload
    #[serde(default, rename = "photoFilename", skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<String>,
}

impl TravelNote {
    pub fn memo(
        location: GpsPoint,
        timestamp: DateTime<Utc>,
        counters: SensorCounters,
        text: impl Into<String>,
    ) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::base(NoteKind::Memo, location, timestamp, counters)
        }
    }

    pub fn photo(
        location: GpsPoint,
        timestamp: DateTime<Utc>,
        counters: SensorCounters,
        photo_ref: impl Into<String>,
    ) -> Self {
        Self {
            photo_ref: Some(photo_ref.into()),
            ..Self::base(NoteKind::Photo, location, timestamp, counters)
        }
    }

    fn base(kind: NoteKind, location: GpsPoint, timestamp: DateTime<Utc>, counters: SensorCounters) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            latitude: location.latitude,
            longitude: location.longitude,
            timestamp,
            steps: counters.steps,
            distance_meters: counters.distance_meters,
            text: None,
            photo_ref: None,
        }
    }

    pub fn location(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// A finished recording session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    pub title: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    #[serde(rename = "routeLatLons", with = "route_lat_lons", default)]
    pub route: Vec<GpsPoint>,
    pub notes: Vec<TravelNote>,
    pub steps: u32,
    pub distance_meters: f64,
}

/// Headline numbers for a trip list row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripSummary {
    pub route_points: usize,
    pub notes: usize,
    pub duration: Duration,
    pub steps: u32,
    pub distance_meters: f64,
}

impl Trip {
    pub fn new(
        title: impl Into<String>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        route: Vec<GpsPoint>,
        notes: Vec<TravelNote>,
        counters: SensorCounters,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            started_at,
            ended_at,
            route,
            notes,
            steps: counters.steps,
            distance_meters: counters.distance_meters,
        }
    }

    pub fn duration(&self) -> Duration {
        self.ended_at - self.started_at
    }

    pub fn summary(&self) -> TripSummary {
        TripSummary {
            route_points: self.route.len(),
            notes: self.notes.len(),
            duration: self.duration(),
            steps: self.steps,
            distance_meters: self.distance_meters,
        }
    }

    /// Geometric length of the recorded route, independent of the pedometer distance.
    pub fn route_length_meters(&self) -> f64 {
        polyline_length(&self.route)
    }

    /// Bounds of the route, or of the notes when no route was recorded.
    pub fn bounds(&self) -> Option<Bounds> {
        if !self.route.is_empty() {
            return compute_bounds(&self.route);
        }
        let note_points: Vec<GpsPoint> = self.notes.iter().map(|n| n.location()).collect();
        compute_bounds(&note_points)
    }

    /// Where a map of this trip should initially center: the first route
    /// point, else the first note.
    pub fn map_center(&self) -> Option<GpsPoint> {
        self.route
            .first()
            .copied()
            .or_else(|| self.notes.first().map(|n| n.location()))
    }

    /// Route thinned to about `max_points` for map rendering.
    pub fn route_for_map(&self, max_points: usize) -> Vec<GpsPoint> {
        downsample(&self.route, max_points)
    }

    /// Storage references of all photo notes, for cleanup on delete.
    pub fn photo_refs(&self) -> Vec<&str> {
        self.notes
            .iter()
            .filter_map(|n| n.photo_ref.as_deref())
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trip(")?;
        writeln!(f, "  title: {},", self.title)?;
        writeln!(f, "  startedAt: {},", self.started_at.to_rfc3339())?;
        writeln!(f, "  endedAt: {},", self.ended_at.to_rfc3339())?;
        writeln!(f, "  steps: {},", self.steps)?;
        writeln!(f, "  distanceMeters: {:.1},", self.distance_meters)?;
        writeln!(f, "  routeCount: {},", self.route.len())?;
        writeln!(f, "  notesCount: {}", self.notes.len())?;
        write!(f, ")")
    }
}

/// Order trips for a history list: most recently started first.
pub fn sort_trips_newest_first(trips: &mut [Trip]) {
    trips.sort_by(|a, b| b.started_at.cmp(&a.started_at));
}

/// Object-store path for a note's photo.
///
/// ```
/// use trip_recorder::photo_storage_path;
/// use uuid::Uuid;
///
/// let trip_id = Uuid::parse_str("6f1c9a8e-2b34-4c5d-9e6f-7a8b9c0d1e2f").unwrap();
/// let note_id = Uuid::parse_str("0a1b2c3d-4e5f-4061-8293-a4b5c6d7e8f9").unwrap();
/// assert_eq!(
///     photo_storage_path("uid123", &trip_id, &note_id),
///     "users/uid123/photos/6F1C9A8E-2B34-4C5D-9E6F-7A8B9C0D1E2F/0A1B2C3D-4E5F-4061-8293-A4B5C6D7E8F9.jpg"
/// );
/// ```
pub fn photo_storage_path(uid: &str, trip_id: &Uuid, note_id: &Uuid) -> String {
    format_photo_path(uid, &trip_id.to_string(), &note_id.to_string())
}

pub(crate) fn format_photo_path(uid: &str, trip_id: &str, note_id: &str) -> String {
    format!(
        "users/{}/photos/{}/{}.jpg",
        uid,
        trip_id.to_uppercase(),
        note_id.to_uppercase()
    )
}

/// Route (de)serialization: flat on write, flat or nested on read.
mod route_lat_lons {
    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::GpsPoint;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RouteRepr {
        Nested(Vec<Vec<f64>>),
        Flat(Vec<f64>),
        Other(IgnoredAny),
    }

    pub fn serialize<S>(route: &[GpsPoint], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(route.iter().flat_map(|p| [p.latitude, p.longitude]))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<GpsPoint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let route = match RouteRepr::deserialize(deserializer)? {
            RouteRepr::Nested(pairs) => pairs
                .into_iter()
                .filter(|pair| pair.len() == 2)
                .map(|pair| GpsPoint::new(pair[0], pair[1]))
                .collect(),
            RouteRepr::Flat(flat) => flat
                .chunks_exact(2)
                .map(|c| GpsPoint::new(c[0], c[1]))
                .collect(),
            RouteRepr::Other(_) => {
                log::warn!("[Trip] unrecognized routeLatLons shape, decoding as empty route");
                Vec::new()
            }
        };
        Ok(route)
    }
}
