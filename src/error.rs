//! Unified error handling for the visit-finder library.
//!
//! Boundary failures (input parsing, parameter resolution, file access) are
//! fatal to a run and surface as [`VisitError`]. Per-point parse failures
//! inside a timeline path never reach this type; the matcher recovers them
//! locally.

use std::fmt;

/// Unified error type for visit-finder operations.
#[derive(Debug, Clone, PartialEq)]
pub enum VisitError {
    /// The input is not a well-formed sequence of timeline segments
    MalformedInput { message: String },
    /// Reference point components are missing, non-numeric or out of range
    InvalidReferencePoint { input: String, message: String },
    /// Reference point text is not `lat, lng` or `(lat, lng)`
    InvalidCoordinateFormat { input: String },
    /// Tolerance is negative or not a finite number
    InvalidTolerance { value: f64 },
    /// Reading or writing a file failed
    Io { path: String, message: String },
}

impl fmt::Display for VisitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisitError::MalformedInput { message } => {
                write!(f, "Malformed location history: {}", message)
            }
            VisitError::InvalidReferencePoint { input, message } => {
                write!(f, "Invalid reference point '{}': {}", input, message)
            }
            VisitError::InvalidCoordinateFormat { input } => {
                write!(
                    f,
                    "Invalid coordinate format '{}', expected 'lat, lng' or '(lat, lng)'",
                    input
                )
            }
            VisitError::InvalidTolerance { value } => {
                write!(f, "Invalid tolerance {}, must be a non-negative number", value)
            }
            VisitError::Io { path, message } => {
                write!(f, "I/O error on '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for VisitError {}

impl From<serde_json::Error> for VisitError {
    fn from(err: serde_json::Error) -> Self {
        VisitError::MalformedInput {
            message: err.to_string(),
        }
    }
}

impl VisitError {
    /// Wrap an I/O error together with the path it happened on.
    pub fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        VisitError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for visit-finder operations.
pub type Result<T> = std::result::Result<T, VisitError>;

/// Extension trait for converting Option to VisitError.
pub trait OptionExt<T> {
    /// Convert Option to Result with an invalid reference point error.
    fn ok_or_reference_point(self, input: &str, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_reference_point(self, input: &str, message: &str) -> Result<T> {
        self.ok_or_else(|| VisitError::InvalidReferencePoint {
            input: input.to_string(),
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VisitError::InvalidCoordinateFormat {
            input: "abc".to_string(),
        };
        assert!(err.to_string().contains("'abc'"));
        assert!(err.to_string().contains("lat, lng"));
    }

    #[test]
    fn test_option_ext() {
        let none: Option<f64> = None;
        let result = none.ok_or_reference_point("x, 1", "latitude is not a number");
        assert!(matches!(
            result,
            Err(VisitError::InvalidReferencePoint { .. })
        ));
    }

    #[test]
    fn test_json_error_is_malformed_input() {
        let err: VisitError = serde_json::from_str::<Vec<u8>>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, VisitError::MalformedInput { .. }));
    }
}
