//! # Metadata Report Model
//!
//! Serde model of the metadata report a provider publishes for a data
//! dictionary: the resources it serves, every field of every resource, and
//! the lookup values that make up each enumeration.
//!
//! The report is plain input data. Nothing here caches or indexes it;
//! [`crate::generate::generate`] reads it afresh on every call, so callers
//! may push or pop fields and lookups between runs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ddcert_core::{load_document, DocumentError};

/// A metadata report: resources, fields and lookups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataReport {
    /// Free-form description carried by the report, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Data dictionary version the report claims, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Resources served.
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
    /// Fields of all resources.
    #[serde(default)]
    pub fields: Vec<FieldEntry>,
    /// Lookup values of all enumerations.
    #[serde(default)]
    pub lookups: Vec<LookupEntry>,
}

/// A resource advertised by the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    /// Resource name, e.g. `Property`.
    pub resource_name: String,
}

/// A field advertised for a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEntry {
    /// Owning resource.
    pub resource_name: String,
    /// Field name as it appears in payloads.
    pub field_name: String,
    /// Declared type: an `Edm.*` primitive, a lookup name, or a resource
    /// name (possibly wrapped in `Collection(...)`).
    #[serde(rename = "type")]
    pub type_name: String,
    /// Resource named by an expansion field when `type` does not name it.
    #[serde(default, rename = "typeName", skip_serializing_if = "Option::is_none")]
    pub expansion_type: Option<String>,
    /// Whether `null` is an acceptable value. Absent means nullable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    /// Maximum string length, only meaningful for string fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// Multi-valued field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_collection: Option<bool>,
    /// Navigation (expansion) field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_expansion: Option<bool>,
    /// Annotations attached to the field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl FieldEntry {
    /// Build a field with only the required properties set.
    pub fn new(
        resource_name: impl Into<String>,
        field_name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            resource_name: resource_name.into(),
            field_name: field_name.into(),
            type_name: type_name.into(),
            expansion_type: None,
            nullable: None,
            max_length: None,
            is_collection: None,
            is_expansion: None,
            annotations: Vec::new(),
        }
    }

    /// Nullability with the CSDL default applied.
    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(true)
    }
}

/// A single lookup value belonging to the group `lookup_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupEntry {
    /// Group the value belongs to; fields reference the group by this name.
    pub lookup_name: String,
    /// The value itself.
    pub lookup_value: String,
    /// Underlying type of the group: `Edm.String` for string
    /// enumerations, an integer type for legacy OData enumerations.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Annotations attached to the value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl LookupEntry {
    /// Build a lookup value.
    pub fn new(
        lookup_name: impl Into<String>,
        lookup_value: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            lookup_name: lookup_name.into(),
            lookup_value: lookup_value.into(),
            type_name: type_name.into(),
            annotations: Vec::new(),
        }
    }
}

/// A metadata annotation (`term` plus arbitrary value).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation term, e.g. `RESO.OData.Metadata.StandardName`.
    pub term: String,
    /// Annotation value.
    #[serde(default)]
    pub value: Value,
}

impl MetadataReport {
    /// Load a report from a `.json`, `.yaml` or `.yml` file.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Load` if the file cannot be read or parsed,
    /// and `DocumentError::Shape` if it is not a metadata report.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let value = load_document(path)?;
        Self::from_value(value, &path.display().to_string())
    }

    /// Interpret an already-parsed document as a report.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Shape` if the value does not match the
    /// report shape.
    pub fn from_value(value: Value, label: &str) -> Result<Self, DocumentError> {
        serde_json::from_value(value).map_err(|e| DocumentError::Shape {
            path: label.to_string(),
            reason: format!("not a metadata report: {e}"),
        })
    }

    /// True if `name` is one of the advertised resources.
    pub fn has_resource(&self, name: &str) -> bool {
        self.resources.iter().any(|r| r.resource_name == name)
    }

    /// Fields belonging to `resource_name`, in report order.
    pub fn fields_for<'a>(&'a self, resource_name: &'a str) -> impl Iterator<Item = &'a FieldEntry> {
        self.fields.iter().filter(move |f| f.resource_name == resource_name)
    }
}
