//! Per-segment visit detection.
//!
//! A segment is a visit when any point of its path falls strictly inside an
//! axis-aligned box around the reference point. This is a per-axis degree
//! comparison, not a distance: the box is wider in meters east-west than
//! north-south away from the equator.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use geo::{Coord, Rect};

use crate::timeline::TimelineSegment;
use crate::{GpsPoint, VisitConfig, VisitDay};

/// Prefix of encoded path points.
pub const GEO_PREFIX: &str = "geo:";

/// Open box of half-width `tolerance` degrees around a center point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceBox {
    center: Coord,
    tolerance: f64,
}

impl ToleranceBox {
    pub fn new(center: GpsPoint, tolerance_degrees: f64) -> Self {
        Self {
            center: center.to_coord(),
            tolerance: tolerance_degrees,
        }
    }

    /// Strict on both axes: a point exactly `tolerance` away is outside.
    pub fn contains(&self, point: &GpsPoint) -> bool {
        let delta = point.to_coord() - self.center;
        delta.y.abs() < self.tolerance && delta.x.abs() < self.tolerance
    }

    /// The box as a `geo` rectangle (x = longitude, y = latitude).
    pub fn bounds(&self) -> Rect {
        let half = Coord {
            x: self.tolerance,
            y: self.tolerance,
        };
        Rect::new(self.center - half, self.center + half)
    }
}

impl From<&VisitConfig> for ToleranceBox {
    fn from(config: &VisitConfig) -> Self {
        Self::new(config.reference, config.tolerance_degrees)
    }
}

/// Decode a `geo:<lat>,<lng>` point.
///
/// Returns `None` for a missing prefix, a missing comma, or components that
/// are not finite numbers.
///
/// # Example
/// ```
/// use visit_finder::parse_geo_point;
///
/// let p = parse_geo_point("geo:35.660638,139.711885").unwrap();
/// assert_eq!(p.longitude, 139.711885);
/// assert!(parse_geo_point("35.660638,139.711885").is_none());
/// ```
pub fn parse_geo_point(encoded: &str) -> Option<GpsPoint> {
    let (lat, lng) = encoded.strip_prefix(GEO_PREFIX)?.split_once(',')?;
    let latitude = lat.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    let longitude = lng.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(GpsPoint::new(latitude, longitude))
}

/// Calendar date of a timestamp as seen in `tz`.
pub fn local_date<Tz: TimeZone>(time: &DateTime<FixedOffset>, tz: &Tz) -> NaiveDate {
    time.with_timezone(tz).date_naive()
}

/// Whether any point of the segment's path lies inside the box.
///
/// Undecodable points are skipped rather than failing the segment.
pub fn segment_touches(segment: &TimelineSegment, area: &ToleranceBox) -> bool {
    let Some(path) = segment.path() else {
        return false;
    };
    path.iter().any(|p| match parse_geo_point(&p.point) {
        Some(point) => area.contains(&point),
        None => {
            log::debug!(
                "Skipping undecodable point {:?} in segment starting {}",
                p.point,
                segment.start_time
            );
            false
        }
    })
}

/// Decide whether a segment is a visit and attribute it to a day.
///
/// The day is the calendar date of the segment's start time in `tz`; the end
/// time plays no part. Segments without a path never match.
pub fn match_segment<Tz: TimeZone>(
    segment: &TimelineSegment,
    config: &VisitConfig,
    tz: &Tz,
) -> Option<VisitDay> {
    let area = ToleranceBox::from(config);
    segment_touches(segment, &area).then(|| VisitDay::new(local_date(&segment.start_time, tz)))
}
