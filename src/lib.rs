//! # Visit Finder
//!
//! Finds the calendar dates on which a location-history export passed near a
//! reference coordinate, grouped by month.
//!
//! This library provides:
//! - Typed parsing of timeline exports (activity, visit and path segments)
//! - Coordinate and tolerance resolution from free-text user input
//! - Per-segment visit detection using an axis-aligned tolerance box
//! - Month/date grouping with deterministic ordering
//!
//! ## Features
//!
//! - **`parallel`** - Fold segments in parallel with rayon
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use visit_finder::{process_location_history, QueryInput, VisitReport};
//!
//! let json = r#"[
//!   {
//!     "startTime": "2025-01-14T04:00:00.000Z",
//!     "endTime": "2025-01-14T06:00:00.000Z",
//!     "timelinePath": [
//!       { "point": "geo:35.661900,139.708100", "durationMinutesOffsetFromStartTime": "55" }
//!     ]
//!   }
//! ]"#;
//!
//! let report = process_location_history(json, &QueryInput::default()).unwrap();
//! assert!(matches!(report, VisitReport::Found { .. }));
//! ```

use chrono::{Datelike, NaiveDate};
use geo::Coord;
use serde::{Deserialize, Serialize};
use std::fmt;

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, VisitError};

// Reference point and tolerance resolution
pub mod config;
pub use config::{
    parse_reference_point, reference_from_components, QueryInput, Tolerance, VisitConfig,
    DEFAULT_REFERENCE, DEFAULT_TOLERANCE_DEGREES, METERS_PER_DEGREE,
};

// Timeline export model and JSON boundary
pub mod timeline;
pub use timeline::{
    load_timeline, parse_timeline, ActivityMove, PathPoint, PlaceVisit, SegmentKind,
    TimelineSegment,
};

// Per-segment visit detection
pub mod matching;
pub use matching::{match_segment, parse_geo_point, ToleranceBox};

// Month/date aggregation
pub mod grouping;
#[cfg(feature = "parallel")]
pub use grouping::{find_visits_parallel, find_visits_parallel_in};
pub use grouping::{find_visits, find_visits_in, VisitIndex};

// Caller-held state for re-running on parameter changes
pub mod session;
pub use session::{RunRequest, RunTicket, VisitSession};

// Rendering of reports for people and machines
pub mod presentation;
pub use presentation::{failure_message, render_json, render_text, DateStyle};

// Saved user preferences (CLI only, never read by the core)
pub mod preferences;
pub use preferences::Preferences;

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use visit_finder::GpsPoint;
/// let point = GpsPoint::new(35.6615, 139.7087); // Aoyama, Tokyo
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
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

    /// Convert to a `geo` coordinate (x = longitude, y = latitude).
    pub fn to_coord(&self) -> Coord {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }
}

impl fmt::Display for GpsPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Calendar month used to group visit dates.
///
/// Ordering is by year first, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    /// Month number, 1-12
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// The month a calendar date falls in.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Attribution of a matched segment: the local calendar date of its start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisitDay {
    pub month: MonthKey,
    pub date: NaiveDate,
}

impl VisitDay {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            month: MonthKey::of(date),
            date,
        }
    }
}

/// Visit dates within one month, earliest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthVisits {
    pub month: MonthKey,
    pub dates: Vec<NaiveDate>,
}

/// Outcome of a successful run.
///
/// `NoVisits` distinguishes "ran with zero matches" from "did not run";
/// `Found` never holds an empty month list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum VisitReport {
    /// Months most recent first, each with dates earliest first
    Found { months: Vec<MonthVisits> },
    NoVisits,
}

impl VisitReport {
    /// Months in presentation order (empty for `NoVisits`).
    pub fn months(&self) -> &[MonthVisits] {
        match self {
            VisitReport::Found { months } => months,
            VisitReport::NoVisits => &[],
        }
    }

    /// Total number of distinct visit dates.
    pub fn total_days(&self) -> usize {
        self.months().iter().map(|m| m.dates.len()).sum()
    }
}

// ============================================================================
// Core Functions
// ============================================================================

/// Run the whole pipeline on raw export text.
///
/// Parameters are resolved before the input is parsed, so an invalid
/// reference point is reported even when the input is also malformed. Dates
/// are attributed in the system's local time zone.
pub fn process_location_history(json: &str, query: &QueryInput) -> Result<VisitReport> {
    let config = VisitConfig::resolve(query)?;
    let segments = parse_timeline(json)?;
    Ok(find_visits(&segments, &config))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gps_point_validation() {
        assert!(GpsPoint::new(35.6615, 139.7087).is_valid());
        assert!(!GpsPoint::new(91.0, 0.0).is_valid());
        assert!(!GpsPoint::new(0.0, 181.0).is_valid());
        assert!(!GpsPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_month_key_ordering() {
        assert!(MonthKey::new(2025, 1) > MonthKey::new(2024, 12));
        assert!(MonthKey::new(2024, 11) < MonthKey::new(2024, 12));
        assert_eq!(MonthKey::new(2025, 1).to_string(), "2025-01");
    }

    #[test]
    fn test_report_serializes_with_status_tag() {
        let report = VisitReport::Found {
            months: vec![MonthVisits {
                month: MonthKey::new(2025, 1),
                dates: vec![NaiveDate::from_ymd_opt(2025, 1, 14).unwrap()],
            }],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "found");
        assert_eq!(json["months"][0]["dates"][0], "2025-01-14");

        let json = serde_json::to_value(VisitReport::NoVisits).unwrap();
        assert_eq!(json["status"], "noVisits");
    }

    #[test]
    fn test_invalid_reference_rejected_before_parsing() {
        let query = QueryInput {
            reference_text: Some("abc".to_string()),
            ..QueryInput::default()
        };
        let result = process_location_history("not json", &query);
        assert!(matches!(
            result,
            Err(VisitError::InvalidCoordinateFormat { .. })
        ));
    }
}
