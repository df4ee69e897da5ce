//! # Validation Config
//!
//! Per-field overrides keyed by `version -> resource -> field`:
//!
//! ```yaml
//! "2.0":
//!   Property:
//!     StandardStatus:
//!       ignoreEnumerations: true
//! ```
//!
//! `ignoreEnumerations` downgrades enumeration mismatches in that field
//! from errors to a fixed warning. Unknown option keys are ignored so that
//! configs written for newer releases still load.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ddcert_core::{load_document, DocumentError};

/// Options for one field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOptions {
    /// Report enumeration mismatches as warnings.
    #[serde(default)]
    pub ignore_enumerations: bool,
}

type FieldOverrides = BTreeMap<String, FieldOptions>;
type ResourceOverrides = BTreeMap<String, FieldOverrides>;

/// Overrides for every version, resource and field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationConfig {
    versions: BTreeMap<String, ResourceOverrides>,
}

impl ValidationConfig {
    /// An empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a `.json`, `.yaml` or `.yml` file.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Load` if the file cannot be read or parsed,
    /// and `DocumentError::Shape` if it does not have the config shape.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let value = load_document(path)?;
        Self::from_value(value, &path.display().to_string())
    }

    /// Interpret an already-parsed document as a config.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Shape` on a shape mismatch.
    pub fn from_value(value: Value, label: &str) -> Result<Self, DocumentError> {
        serde_json::from_value(value).map_err(|e| DocumentError::Shape {
            path: label.to_string(),
            reason: format!("not a validation config: {e}"),
        })
    }

    /// Set the options of one field.
    pub fn set(
        &mut self,
        version: impl Into<String>,
        resource_name: impl Into<String>,
        field_name: impl Into<String>,
        options: FieldOptions,
    ) -> &mut Self {
        self.versions
            .entry(version.into())
            .or_default()
            .entry(resource_name.into())
            .or_default()
            .insert(field_name.into(), options);
        self
    }

    /// Options for one field, if configured.
    pub fn field_options(
        &self,
        version: &str,
        resource_name: &str,
        field_name: &str,
    ) -> Option<&FieldOptions> {
        self.versions
            .get(version)?
            .get(resource_name)?
            .get(field_name)
    }

    /// True if enumeration mismatches in this field are downgraded.
    pub fn ignores_enumerations(&self, version: &str, resource_name: &str, field_name: &str) -> bool {
        self.field_options(version, resource_name, field_name)
            .is_some_and(|o| o.ignore_enumerations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_is_exact_on_all_three_levels() {
        let config = ValidationConfig::from_value(
            json!({"2.0": {"Property": {"StandardStatus": {"ignoreEnumerations": true}}}}),
            "inline",
        )
        .unwrap();
        assert!(config.ignores_enumerations("2.0", "Property", "StandardStatus"));
        assert!(!config.ignores_enumerations("1.7", "Property", "StandardStatus"));
        assert!(!config.ignores_enumerations("2.0", "Member", "StandardStatus"));
        assert!(!config.ignores_enumerations("2.0", "Property", "PropertyType"));
    }

    #[test]
    fn test_unknown_options_are_ignored() {
        let config = ValidationConfig::from_value(
            json!({"2.0": {"Property": {"City": {"ignoreEnumerations": false, "futureOption": 1}}}}),
            "inline",
        )
        .unwrap();
        assert_eq!(
            config.field_options("2.0", "Property", "City"),
            Some(&FieldOptions::default())
        );
    }

    #[test]
    fn test_set_builds_nested_entries() {
        let mut config = ValidationConfig::new();
        config.set(
            "2.0",
            "Property",
            "StandardStatus",
            FieldOptions {
                ignore_enumerations: true,
            },
        );
        assert!(config.ignores_enumerations("2.0", "Property", "StandardStatus"));
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let err = ValidationConfig::from_value(json!({"2.0": ["Property"]}), "cfg.json").unwrap_err();
        assert!(matches!(err, DocumentError::Shape { .. }));
    }

    #[test]
    fn test_loads_yaml_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "\"2.0\":\n  Property:\n    StandardStatus:\n      ignoreEnumerations: true\n",
        )
        .unwrap();
        let config = ValidationConfig::from_path(&path).unwrap();
        assert!(config.ignores_enumerations("2.0", "Property", "StandardStatus"));
    }
}
