//! Saved user preferences.
//!
//! Only the host (the CLI) reads and writes this file. The detection core
//! takes its parameters as plain values and never touches it.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VisitError};
use crate::QueryInput;

/// Last-used reference point and tolerance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    /// Reference point text as the user typed it
    pub reference_point: Option<String>,
    pub tolerance_meters: Option<f64>,
}

impl Preferences {
    /// Load preferences; a missing file yields empty preferences.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No preferences at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(VisitError::io(path, e)),
        };
        serde_json::from_str(&content).map_err(|e| VisitError::Io {
            path: path.display().to_string(),
            message: format!("invalid preferences: {}", e),
        })
    }

    /// Write preferences, replacing any previous file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| VisitError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        fs::write(path, json).map_err(|e| VisitError::io(path, e))?;
        log::info!("Saved preferences to {}", path.display());
        Ok(())
    }

    /// Raw parameters for the resolver.
    pub fn to_query(&self) -> QueryInput {
        QueryInput {
            reference_text: self.reference_point.clone(),
            tolerance_meters: self.tolerance_meters,
            ..QueryInput::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_keys() {
        let prefs = Preferences {
            reference_point: Some("35.6615, 139.7087".to_string()),
            tolerance_meters: Some(200.0),
        };
        let value = serde_json::to_value(&prefs).unwrap();
        assert_eq!(value["referencePoint"], "35.6615, 139.7087");
        assert_eq!(value["toleranceMeters"], 200.0);
    }

    #[test]
    fn test_to_query() {
        let prefs = Preferences {
            reference_point: Some("(1, 2)".to_string()),
            tolerance_meters: None,
        };
        let query = prefs.to_query();
        assert_eq!(query.reference_text.as_deref(), Some("(1, 2)"));
        assert!(query.tolerance_meters.is_none());
    }
}
