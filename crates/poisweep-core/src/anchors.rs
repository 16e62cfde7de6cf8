//! YAML-backed anchor registry.
//!
//! The registry is the caller-owned list of fixed search centers (bank
//! branches, in the shipped sample). Manual coordinate pairs bypass it.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geo;
use crate::types::Anchor;
use crate::ConfigError;

/// One registry entry as written in `anchors.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorConfig {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub notes: Option<String>,
}

impl AnchorConfig {
    #[must_use]
    pub fn to_anchor(&self) -> Anchor {
        // Validated at load time, so construction cannot fail here.
        Anchor {
            id: self.id.clone(),
            name: self.name.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnchorsFile {
    pub anchors: Vec<AnchorConfig>,
}

impl AnchorsFile {
    #[must_use]
    pub fn to_anchors(&self) -> Vec<Anchor> {
        self.anchors.iter().map(AnchorConfig::to_anchor).collect()
    }
}

/// Load and validate the anchor registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation (empty id/name, duplicate id, out-of-range coordinates).
pub fn load_anchors(path: &Path) -> Result<AnchorsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::AnchorsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let anchors_file: AnchorsFile = serde_yaml::from_str(&content)?;
    validate_anchors(&anchors_file)?;
    Ok(anchors_file)
}

fn validate_anchors(file: &AnchorsFile) -> Result<(), ConfigError> {
    if file.anchors.is_empty() {
        return Err(ConfigError::Validation(
            "anchors file must list at least one anchor".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();
    for anchor in &file.anchors {
        if anchor.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "anchor id must be non-empty".to_string(),
            ));
        }
        if anchor.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "anchor '{}' has an empty name",
                anchor.id
            )));
        }
        if let Err(e) = geo::validate(anchor.latitude, anchor.longitude) {
            return Err(ConfigError::Validation(format!(
                "anchor '{}': {e}",
                anchor.id
            )));
        }
        if !seen_ids.insert(anchor.id.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate anchor id: '{}'",
                anchor.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<(), ConfigError> {
        let file: AnchorsFile = serde_yaml::from_str(yaml).unwrap();
        validate_anchors(&file)
    }

    #[test]
    fn valid_registry_passes() {
        let yaml = r"
anchors:
  - id: SBIN0017040
    name: PANATHUR
    latitude: 12.9382107
    longitude: 77.6992385
  - id: SBIN0015647
    name: BELLANDUR
    latitude: 12.9188658
    longitude: 77.6700914
";
        assert!(parse(yaml).is_ok());
    }

    #[test]
    fn duplicate_id_is_rejected_case_insensitively() {
        let yaml = r"
anchors:
  - id: abc
    name: One
    latitude: 1.0
    longitude: 1.0
  - id: ABC
    name: Two
    latitude: 2.0
    longitude: 2.0
";
        let err = parse(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate anchor id"));
    }

    #[test]
    fn out_of_range_coordinate_is_rejected() {
        let yaml = r"
anchors:
  - id: abc
    name: Broken
    latitude: 95.0
    longitude: 10.0
";
        let err = parse(yaml).unwrap_err();
        assert!(err.to_string().contains("invalid coordinate"));
    }

    #[test]
    fn empty_registry_is_rejected() {
        let yaml = "anchors: []";
        assert!(parse(yaml).is_err());
    }

    #[test]
    fn empty_name_is_rejected() {
        let yaml = r#"
anchors:
  - id: abc
    name: "  "
    latitude: 1.0
    longitude: 1.0
"#;
        assert!(parse(yaml).is_err());
    }
}
