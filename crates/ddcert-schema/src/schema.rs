//! # Structural Schema
//!
//! The structural schema is what the payload walker consumes: one
//! [`ResourceSchema`] per resource, each a map from field name to
//! [`FieldRule`]. Rules are a closed set of kinds so the walker matches on
//! them exhaustively.
//!
//! Expansion rules name their target resource instead of embedding it.
//! Resources may expand into themselves or into an ancestor; the walker
//! resolves the target at traversal time, so recursion depth is bounded by
//! the payload, never by the schema.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Structural schema for every resource in a metadata report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub(crate) resources: BTreeMap<String, ResourceSchema>,
}

impl Schema {
    /// Look up the rules for one resource.
    pub fn resource(&self, name: &str) -> Option<&ResourceSchema> {
        self.resources.get(name)
    }

    /// Names of all resources, sorted.
    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Iterate `(resource name, resource schema)` pairs in name order.
    pub fn resources(&self) -> impl Iterator<Item = (&str, &ResourceSchema)> {
        self.resources.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// True if the schema defines no resources.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Field rules for one resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSchema {
    pub(crate) fields: BTreeMap<String, FieldRule>,
}

impl ResourceSchema {
    /// Rule for `field_name`, if advertised.
    pub fn field(&self, field_name: &str) -> Option<&FieldRule> {
        self.fields.get(field_name)
    }

    /// Iterate `(field name, rule)` pairs in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of advertised fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the resource advertises no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// How one field is validated.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    /// Whether `null` is accepted.
    pub nullable: bool,
    /// The rule kind and its parameters.
    pub kind: FieldKind,
}

/// The closed set of rule kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A JSON primitive with optional constraints.
    Primitive(PrimitiveRule),
    /// An array whose every element satisfies the primitive rule.
    PrimitiveList(PrimitiveRule),
    /// A single enumeration value.
    Enum(EnumRule),
    /// Several enumeration values, as an array or a comma-separated string.
    StringList(EnumRule),
    /// An inline object (or array of objects) of another resource.
    Expansion(ExpansionRule),
}

impl FieldKind {
    /// The JSON kind a value must have, used in type mismatch messages.
    /// `None` means any value is accepted.
    pub fn expected_json_kind(&self) -> Option<JsonKind> {
        match self {
            Self::Primitive(p) => p.expected_json_kind(),
            Self::Enum(_) => Some(JsonKind::String),
            Self::PrimitiveList(_) | Self::StringList(_) => Some(JsonKind::Array),
            Self::Expansion(e) if e.is_collection => Some(JsonKind::Array),
            Self::Expansion(_) => Some(JsonKind::Object),
        }
    }
}

/// Primitive rule kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveRule {
    /// A string, optionally length-bounded and format-checked.
    String {
        /// Advertised maximum length in characters.
        max_length: Option<u64>,
        /// Required textual format.
        format: Option<StringFormat>,
    },
    /// `true` or `false`.
    Boolean,
    /// An integral number within bounds.
    Integer(IntegerBounds),
    /// Any number.
    Number,
    /// Anything; used for types the mapper does not recognize.
    Any,
}

impl PrimitiveRule {
    fn expected_json_kind(&self) -> Option<JsonKind> {
        match self {
            Self::String { .. } => Some(JsonKind::String),
            Self::Boolean => Some(JsonKind::Boolean),
            Self::Integer(_) => Some(JsonKind::Integer),
            Self::Number => Some(JsonKind::Number),
            Self::Any => None,
        }
    }
}

/// Inclusive integer bounds for a fixed-width integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerBounds {
    /// Smallest accepted value.
    pub min: i128,
    /// Largest accepted value.
    pub max: i128,
}

impl IntegerBounds {
    /// Bounds for a `bits`-wide integer: `[-2^(bits-1), 2^bits - 1]`.
    ///
    /// The upper bound is the unsigned maximum of the width
    /// (`4294967295` for 32 bits).
    pub const fn for_width(bits: u32) -> Self {
        Self {
            min: -(1i128 << (bits - 1)),
            max: (1i128 << bits) - 1,
        }
    }

    /// Bounds of an unsigned 8-bit integer.
    pub const BYTE: Self = Self { min: 0, max: 255 };

    /// Bounds of a signed 8-bit integer.
    pub const SBYTE: Self = Self { min: -128, max: 127 };
}

/// Textual formats checked on string primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    /// `YYYY-MM-DD`.
    Date,
    /// RFC 3339 timestamp with offset.
    DateTime,
    /// `HH:MM:SS` with optional fraction.
    Time,
    /// Hyphenated UUID.
    Uuid,
}

impl StringFormat {
    /// JSON Schema `format` keyword value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::DateTime => "date-time",
            Self::Time => "time",
            Self::Uuid => "uuid",
        }
    }
}

impl fmt::Display for StringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allowed values of an enumeration field.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumRule {
    /// Lookup group the values come from.
    pub lookup_name: String,
    /// The allowed values. Shared by every field typed with the group.
    pub allowed_values: Arc<BTreeSet<String>>,
    /// Values must also be OData simple identifiers (legacy enumerations).
    pub odata_identifiers: bool,
}

impl EnumRule {
    /// True if `value` is an allowed value.
    pub fn allows(&self, value: &str) -> bool {
        self.allowed_values.contains(value)
    }
}

/// Target of an expansion field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionRule {
    /// Resource whose rules apply to the nested object(s).
    pub target_resource: String,
    /// An array of objects rather than a single object.
    pub is_collection: bool,
}

/// JSON value kinds as named in defect messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    /// Classify a JSON value. Integral numbers are `integer`.
    pub fn of(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Lowercase name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int32_bounds_match_certification_boundary() {
        let b = IntegerBounds::for_width(32);
        assert_eq!(b.max, 4_294_967_295);
        assert_eq!(b.min, -2_147_483_648);
    }

    #[test]
    fn test_int64_bounds_do_not_overflow() {
        let b = IntegerBounds::for_width(64);
        assert_eq!(b.max, u64::MAX as i128);
        assert_eq!(b.min, i64::MIN as i128);
    }

    #[test]
    fn test_json_kind_classification() {
        assert_eq!(JsonKind::of(&json!(null)), JsonKind::Null);
        assert_eq!(JsonKind::of(&json!(1)), JsonKind::Integer);
        assert_eq!(JsonKind::of(&json!(1.5)), JsonKind::Number);
        assert_eq!(JsonKind::of(&json!("x")), JsonKind::String);
        assert_eq!(JsonKind::of(&json!([])), JsonKind::Array);
        assert_eq!(JsonKind::of(&json!({})), JsonKind::Object);
        assert_eq!(JsonKind::of(&json!(true)).to_string(), "boolean");
    }

    #[test]
    fn test_expected_kind_per_rule() {
        let single = FieldKind::Expansion(ExpansionRule {
            target_resource: "Member".into(),
            is_collection: false,
        });
        let many = FieldKind::Expansion(ExpansionRule {
            target_resource: "Media".into(),
            is_collection: true,
        });
        assert_eq!(single.expected_json_kind(), Some(JsonKind::Object));
        assert_eq!(many.expected_json_kind(), Some(JsonKind::Array));
        assert_eq!(FieldKind::Primitive(PrimitiveRule::Any).expected_json_kind(), None);
        assert_eq!(
            FieldKind::PrimitiveList(PrimitiveRule::Any).expected_json_kind(),
            Some(JsonKind::Array)
        );
    }
}
