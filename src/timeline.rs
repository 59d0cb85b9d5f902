//! Timeline export model and JSON boundary.
//!
//! An export is a JSON array of segments. Each segment carries a start time
//! and at most one meaningful payload: a movement (`activity`), a stay at a
//! place (`visit`), or a raw path of geo-points (`timelinePath`). Only the
//! path variant can produce a visit; the other payloads are kept for
//! passthrough.
//!
//! Only `startTime` and the shape of the array are load-bearing. Passthrough
//! fields and the `point` encoding are read leniently: a value of an
//! unexpected type is dropped (or left unparseable) instead of failing the
//! whole export.

use std::fs;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Result, VisitError};

/// One sample of a timeline path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathPoint {
    /// Encoded as `geo:<lat>,<lng>`; parsed lazily by the matcher
    #[serde(default, deserialize_with = "point_text")]
    pub point: String,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_minutes_offset_from_start_time: Option<String>,
}

impl PathPoint {
    pub fn new(point: impl Into<String>) -> Self {
        Self {
            point: point.into(),
            duration_minutes_offset_from_start_time: None,
        }
    }
}

/// Most likely mode of a movement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityCandidate {
    #[serde(rename = "type", deserialize_with = "lenient_text")]
    pub activity_type: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub probability: Option<String>,
}

/// Movement between two places.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityMove {
    #[serde(deserialize_with = "lenient_text")]
    pub start: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub end: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub distance_meters: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub top_candidate: Option<ActivityCandidate>,
}

/// Most likely place of a stay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaceCandidate {
    #[serde(deserialize_with = "lenient_text")]
    pub probability: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub semantic_type: Option<String>,
    #[serde(rename = "placeID", deserialize_with = "lenient_text")]
    pub place_id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub place_location: Option<String>,
}

/// Stay at a place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaceVisit {
    #[serde(deserialize_with = "lenient_text")]
    pub hierarchy_level: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub probability: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub top_candidate: Option<PlaceCandidate>,
}

/// Payload of a segment.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentKind {
    Path(Vec<PathPoint>),
    Visit(PlaceVisit),
    Activity(ActivityMove),
    /// None of the known payloads
    Other,
}

/// One interval record of the location history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSegment", into = "RawSegment")]
pub struct TimelineSegment {
    /// Attribution key for the segment
    pub start_time: DateTime<FixedOffset>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub kind: SegmentKind,
}

impl TimelineSegment {
    /// Path-bearing segment, mostly useful for building inputs by hand.
    pub fn with_path(start_time: DateTime<FixedOffset>, points: Vec<PathPoint>) -> Self {
        Self {
            start_time,
            end_time: None,
            kind: SegmentKind::Path(points),
        }
    }

    /// The path of this segment, if it has a non-empty one.
    pub fn path(&self) -> Option<&[PathPoint]> {
        match &self.kind {
            SegmentKind::Path(points) if !points.is_empty() => Some(points),
            _ => None,
        }
    }

    pub fn has_path(&self) -> bool {
        self.path().is_some()
    }
}

/// Wire shape of a segment: sibling keys, any of which may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSegment {
    start_time: DateTime<FixedOffset>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    end_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeline_path: Option<Vec<PathPoint>>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    visit: Option<PlaceVisit>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    activity: Option<ActivityMove>,
}

/// Any value that does not deserialize as `T` becomes `None`.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Strings pass through, numbers and booleans keep their textual form,
/// anything else becomes `None`.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// A non-string point is kept as empty text, which never decodes.
fn point_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

impl From<RawSegment> for TimelineSegment {
    fn from(raw: RawSegment) -> Self {
        // A path decides matching, so it wins over the descriptive payloads.
        let kind = match (raw.timeline_path, raw.visit, raw.activity) {
            (Some(path), _, _) => SegmentKind::Path(path),
            (None, Some(visit), _) => SegmentKind::Visit(visit),
            (None, None, Some(activity)) => SegmentKind::Activity(activity),
            (None, None, None) => SegmentKind::Other,
        };
        Self {
            start_time: raw.start_time,
            end_time: raw.end_time,
            kind,
        }
    }
}

impl From<TimelineSegment> for RawSegment {
    fn from(segment: TimelineSegment) -> Self {
        let mut raw = RawSegment {
            start_time: segment.start_time,
            end_time: segment.end_time,
            timeline_path: None,
            visit: None,
            activity: None,
        };
        match segment.kind {
            SegmentKind::Path(path) => raw.timeline_path = Some(path),
            SegmentKind::Visit(visit) => raw.visit = Some(visit),
            SegmentKind::Activity(activity) => raw.activity = Some(activity),
            SegmentKind::Other => {}
        }
        raw
    }
}

/// Parse an export from JSON text.
///
/// Fails with [`VisitError::MalformedInput`] if the text is not a JSON array
/// of segments or any segment lacks a parseable `startTime`.
pub fn parse_timeline(json: &str) -> Result<Vec<TimelineSegment>> {
    let segments: Vec<TimelineSegment> = serde_json::from_str(json)?;
    log::debug!("Parsed {} timeline segments", segments.len());
    Ok(segments)
}

/// Read and parse an export file.
pub fn load_timeline(path: impl AsRef<Path>) -> Result<Vec<TimelineSegment>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| VisitError::io(path, e))?;
    let segments = parse_timeline(&content)?;
    log::info!(
        "Loaded {} segments ({} with paths) from {}",
        segments.len(),
        segments.iter().filter(|s| s.has_path()).count(),
        path.display()
    );
    Ok(segments)
}
