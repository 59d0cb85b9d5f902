//! Reference point and tolerance resolution.
//!
//! Turns raw user input (free-text coordinates, separate latitude/longitude
//! fields, a tolerance in meters or degrees) into a validated [`VisitConfig`].
//! Any failure here aborts the run before a single segment is matched.

use serde::{Deserialize, Serialize};

use crate::error::{OptionExt, Result, VisitError};
use crate::GpsPoint;

/// Reference point used when the caller supplies none (Aoyama, Tokyo).
pub const DEFAULT_REFERENCE: GpsPoint = GpsPoint {
    latitude: 35.6615,
    longitude: 139.7087,
};

/// Tolerance used when the caller supplies none, roughly 200 meters.
pub const DEFAULT_TOLERANCE_DEGREES: f64 = 0.002;

/// Divisor converting meters to coordinate degrees.
///
/// A single flat factor applied to both axes. It is not an ellipsoidal
/// conversion and is only good enough for a rough "nearby" box.
pub const METERS_PER_DEGREE: f64 = 91_000.0;

/// Match tolerance as entered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tolerance {
    Degrees(f64),
    Meters(f64),
}

impl Tolerance {
    /// Resolve to coordinate degrees.
    ///
    /// Negative, NaN and infinite values are rejected.
    pub fn to_degrees(self) -> Result<f64> {
        let (value, degrees) = match self {
            Tolerance::Degrees(d) => (d, d),
            Tolerance::Meters(m) => (m, m / METERS_PER_DEGREE),
        };
        if !value.is_finite() || value < 0.0 {
            return Err(VisitError::InvalidTolerance { value });
        }
        Ok(degrees)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Degrees(DEFAULT_TOLERANCE_DEGREES)
    }
}

/// Raw, unvalidated matcher parameters as collected from a user or a
/// preference store.
///
/// Blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryInput {
    /// `"lat, lng"` or `"(lat, lng)"`; takes precedence over the separate fields
    pub reference_text: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    /// Takes precedence over `tolerance_degrees`
    pub tolerance_meters: Option<f64>,
    pub tolerance_degrees: Option<f64>,
}

/// Validated parameters for visit detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitConfig {
    /// Point a path must pass near to count as a visit
    pub reference: GpsPoint,

    /// Half-width of the match box on each axis, in degrees.
    /// Default: 0.002 (about 200 meters)
    pub tolerance_degrees: f64,
}

impl Default for VisitConfig {
    fn default() -> Self {
        Self {
            reference: DEFAULT_REFERENCE,
            tolerance_degrees: DEFAULT_TOLERANCE_DEGREES,
        }
    }
}

impl VisitConfig {
    /// Build a config from an already parsed point and tolerance.
    pub fn new(reference: GpsPoint, tolerance: Tolerance) -> Result<Self> {
        if !reference.is_valid() {
            return Err(VisitError::InvalidReferencePoint {
                input: reference.to_string(),
                message: "coordinates out of range".to_string(),
            });
        }
        Ok(Self {
            reference,
            tolerance_degrees: tolerance.to_degrees()?,
        })
    }

    /// Resolve raw input into a validated config.
    ///
    /// Reference point: non-blank `reference_text`, else both separate
    /// fields, else [`DEFAULT_REFERENCE`]. Supplying only one of latitude or
    /// longitude is an error rather than a silent fallback. Tolerance:
    /// meters, else degrees, else [`DEFAULT_TOLERANCE_DEGREES`].
    pub fn resolve(input: &QueryInput) -> Result<Self> {
        let text = non_blank(&input.reference_text);
        let lat = non_blank(&input.latitude);
        let lng = non_blank(&input.longitude);

        let reference = match (text, lat, lng) {
            (Some(text), _, _) => parse_reference_point(text)?,
            (None, Some(lat), Some(lng)) => reference_from_components(lat, lng)?,
            (None, None, None) => DEFAULT_REFERENCE,
            (None, lat, lng) => {
                return Err(VisitError::InvalidReferencePoint {
                    input: format!("{}, {}", lat.unwrap_or(""), lng.unwrap_or("")),
                    message: "both latitude and longitude are required".to_string(),
                });
            }
        };

        let tolerance = match (input.tolerance_meters, input.tolerance_degrees) {
            (Some(meters), _) => Tolerance::Meters(meters),
            (None, Some(degrees)) => Tolerance::Degrees(degrees),
            (None, None) => Tolerance::default(),
        };

        let config = Self::new(reference, tolerance)?;
        log::debug!(
            "Resolved reference {} with tolerance {:.6} degrees",
            config.reference,
            config.tolerance_degrees
        );
        Ok(config)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Parse free-text coordinates in the form `lat, lng` or `(lat, lng)`.
///
/// Text that does not have that shape fails with
/// [`VisitError::InvalidCoordinateFormat`]; well-shaped text whose numbers
/// are invalid fails with [`VisitError::InvalidReferencePoint`].
///
/// # Example
/// ```
/// use visit_finder::parse_reference_point;
///
/// let p = parse_reference_point(" (35.6615, 139.7087) ").unwrap();
/// assert_eq!(p.latitude, 35.6615);
/// assert!(parse_reference_point("abc").is_err());
/// ```
pub fn parse_reference_point(text: &str) -> Result<GpsPoint> {
    let format_error = || VisitError::InvalidCoordinateFormat {
        input: text.to_string(),
    };

    let trimmed = text.trim();
    let inner = match trimmed.strip_prefix('(') {
        Some(rest) => rest.strip_suffix(')').ok_or_else(format_error)?,
        None if trimmed.ends_with(')') => return Err(format_error()),
        None => trimmed,
    };
    if inner.contains(['(', ')']) {
        return Err(format_error());
    }

    let mut parts = inner.split(',').map(str::trim);
    let (lat, lng) = match (parts.next(), parts.next(), parts.next()) {
        (Some(lat), Some(lng), None) if !lat.is_empty() && !lng.is_empty() => (lat, lng),
        _ => return Err(format_error()),
    };

    reference_from_components(lat, lng).map_err(|err| match err {
        VisitError::InvalidReferencePoint { message, .. } => VisitError::InvalidReferencePoint {
            input: text.to_string(),
            message,
        },
        other => other,
    })
}

/// Parse a reference point from separate latitude and longitude fields.
pub fn reference_from_components(lat: &str, lng: &str) -> Result<GpsPoint> {
    let input = format!("{}, {}", lat.trim(), lng.trim());

    let latitude = parse_finite(lat).ok_or_reference_point(&input, "latitude is not a number")?;
    let longitude =
        parse_finite(lng).ok_or_reference_point(&input, "longitude is not a number")?;

    let point = GpsPoint::new(latitude, longitude);
    if !point.is_valid() {
        return Err(VisitError::InvalidReferencePoint {
            input,
            message: "coordinates out of range".to_string(),
        });
    }
    Ok(point)
}

fn parse_finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_both_forms() {
        let bare = parse_reference_point("35.6615, 139.7087").unwrap();
        let wrapped = parse_reference_point("(35.6615,139.7087)").unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare, DEFAULT_REFERENCE);
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert!(matches!(
            parse_reference_point("(35.6, 139.7"),
            Err(VisitError::InvalidCoordinateFormat { .. })
        ));
        assert!(matches!(
            parse_reference_point("35.6, 139.7)"),
            Err(VisitError::InvalidCoordinateFormat { .. })
        ));
    }

    #[test]
    fn test_nested_parentheses() {
        for text in ["((35.6, 139.7))", "(35.6, (139.7))", "35.6, (139.7"] {
            assert!(
                matches!(
                    parse_reference_point(text),
                    Err(VisitError::InvalidCoordinateFormat { .. })
                ),
                "{:?}",
                text
            );
        }
    }

    #[test]
    fn test_non_numeric_components() {
        assert!(matches!(
            parse_reference_point("north, east"),
            Err(VisitError::InvalidReferencePoint { .. })
        ));
        assert!(matches!(
            reference_from_components("NaN", "139.7"),
            Err(VisitError::InvalidReferencePoint { .. })
        ));
    }

    #[test]
    fn test_meters_conversion() {
        let degrees = Tolerance::Meters(182.0).to_degrees().unwrap();
        assert!((degrees - 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        assert!(matches!(
            Tolerance::Degrees(-0.1).to_degrees(),
            Err(VisitError::InvalidTolerance { .. })
        ));
        assert!(Tolerance::Meters(f64::INFINITY).to_degrees().is_err());
        assert_eq!(Tolerance::Degrees(0.0).to_degrees().unwrap(), 0.0);
    }

    #[test]
    fn test_resolve_defaults() {
        let config = VisitConfig::resolve(&QueryInput::default()).unwrap();
        assert_eq!(config, VisitConfig::default());
    }

    #[test]
    fn test_resolve_single_component_is_error() {
        let input = QueryInput {
            latitude: Some("35.0".to_string()),
            ..QueryInput::default()
        };
        assert!(matches!(
            VisitConfig::resolve(&input),
            Err(VisitError::InvalidReferencePoint { .. })
        ));
    }

    #[test]
    fn test_resolve_text_wins_over_fields() {
        let input = QueryInput {
            reference_text: Some("10, 20".to_string()),
            latitude: Some("1".to_string()),
            longitude: Some("2".to_string()),
            tolerance_meters: Some(910.0),
            tolerance_degrees: Some(5.0),
        };
        let config = VisitConfig::resolve(&input).unwrap();
        assert_eq!(config.reference, GpsPoint::new(10.0, 20.0));
        assert!((config.tolerance_degrees - 0.01).abs() < 1e-12);
    }
}
