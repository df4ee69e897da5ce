//! # Payload Validation
//!
//! Walks a JSON payload against a structural [`Schema`] and records every
//! deviation into a [`DefectSink`]. Traversal never stops at the first
//! defect: a single call surfaces every defect in the payload.
//!
//! ## Payload Shapes
//!
//! A payload is either a single resource object or an envelope whose
//! `value` property is an array of resource objects. Both shapes must carry
//! a context annotation (`@reso.context` or `@odata.context`) at the top
//! level; without one the payload cannot be interpreted and validation
//! fails with [`ValidationError::NoContextProperty`] before anything is
//! recorded.
//!
//! ## Attribution
//!
//! Defects inside an expansion are attributed to the expansion's target
//! resource and the nested field, never to the parent. Defects about the
//! expansion value itself (a `null` collection, a string where an object
//! belongs) are attributed to the parent resource and the expansion field.
//!
//! ## Non-Mutation
//!
//! The payload is borrowed immutably for the whole walk. Defects go to the
//! sink only.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use ddcert_core::DataDictionaryVersion;

use crate::aggregate::{DefectKey, DefectSink, Occurrence, Severity};
use crate::config::ValidationConfig;
use crate::identifier::{is_simple_identifier, ODATA_SIMPLE_IDENTIFIER_URL};
use crate::schema::{
    EnumRule, ExpansionRule, FieldKind, FieldRule, IntegerBounds, JsonKind, PrimitiveRule,
    ResourceSchema, Schema, StringFormat,
};

/// Context annotation used by RESO payloads.
pub const RESO_CONTEXT_KEY: &str = "@reso.context";
/// Context annotation used by plain OData payloads.
pub const ODATA_CONTEXT_KEY: &str = "@odata.context";
/// Envelope property holding the array of resource objects.
pub const VALUE_KEY: &str = "value";

/// Message recorded when a value is not in its enumeration.
pub const ENUM_MISMATCH_MESSAGE: &str = "MUST be equal to one of the allowed values";

/// Fatal validation errors. Anything else is recorded as a defect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The payload has no context annotation (or is not an object at all).
    #[error("NO_CONTEXT_PROPERTY: payload has neither `@reso.context` nor `@odata.context`")]
    NoContextProperty,

    /// The requested resource is not defined by the schema.
    #[error("resource '{resource_name}' is not defined by the metadata report")]
    UnknownResource {
        /// The requested resource name.
        resource_name: String,
    },
}

impl ValidationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoContextProperty => "NO_CONTEXT_PROPERTY",
            Self::UnknownResource { .. } => "UNKNOWN_RESOURCE",
        }
    }
}

/// Per-call validation settings. Owned by exactly one validation call.
#[derive(Debug, Clone)]
pub struct ValidationContext<'a> {
    /// Resource the payload claims to contain.
    pub resource_name: String,
    /// Data dictionary version being certified.
    pub version: DataDictionaryVersion,
    /// Optional per-field overrides.
    pub validation_config: Option<&'a ValidationConfig>,
    /// Strict Data Dictionary mode: unadvertised fields are errors and
    /// length violations are errors rather than warnings.
    pub is_reso_data_dictionary_schema: bool,
}

impl<'a> ValidationContext<'a> {
    /// Lenient context without overrides.
    pub fn new(resource_name: impl Into<String>, version: DataDictionaryVersion) -> Self {
        Self {
            resource_name: resource_name.into(),
            version,
            validation_config: None,
            is_reso_data_dictionary_schema: false,
        }
    }

    /// Apply per-field overrides.
    pub fn with_config(mut self, config: &'a ValidationConfig) -> Self {
        self.validation_config = Some(config);
        self
    }

    /// Switch strict Data Dictionary mode on or off.
    pub fn data_dictionary_schema(mut self, strict: bool) -> Self {
        self.is_reso_data_dictionary_schema = strict;
        self
    }

    fn ignores_enumerations(&self, resource_name: &str, field_name: &str) -> bool {
        self.validation_config.is_some_and(|c| {
            c.ignores_enumerations(self.version.as_str(), resource_name, field_name)
        })
    }
}

/// Validate `payload` and record defects into `sink`.
///
/// Returns the number of top-level resource objects validated.
///
/// # Errors
///
/// Returns [`ValidationError::NoContextProperty`] if the payload carries no
/// context annotation and [`ValidationError::UnknownResource`] if the
/// context names a resource the schema does not define. Nothing is
/// recorded in either case.
pub fn validate<S: DefectSink + ?Sized>(
    schema: &Schema,
    payload: &Value,
    context: &ValidationContext<'_>,
    sink: &mut S,
) -> Result<usize, ValidationError> {
    let root = payload
        .as_object()
        .filter(|o| has_context(o))
        .ok_or(ValidationError::NoContextProperty)?;

    let resource_name = context.resource_name.as_str();
    let resource = schema
        .resource(resource_name)
        .ok_or_else(|| ValidationError::UnknownResource {
            resource_name: resource_name.to_string(),
        })?;

    let mut walker = Walker {
        schema,
        context,
        sink,
    };

    let items = match root.get(VALUE_KEY) {
        Some(Value::Array(items)) => {
            for (key, value) in root {
                if key != VALUE_KEY {
                    walker.visit_property(resource_name, resource, key, value, "");
                }
            }
            let value_path = child_path("", VALUE_KEY);
            for (i, item) in items.iter().enumerate() {
                let path = index_path(&value_path, i);
                match item {
                    Value::Object(obj) => walker.visit_item(resource_name, resource, obj, &path),
                    other => walker.record_error(
                        resource_name,
                        VALUE_KEY,
                        must_be(JsonKind::Object, false, JsonKind::of(other)),
                        Occurrence::at(path),
                    ),
                }
            }
            items.len()
        }
        _ => {
            walker.visit_item(resource_name, resource, root, "");
            1
        }
    };

    tracing::debug!(
        resource = resource_name,
        version = %context.version,
        items,
        strict = context.is_reso_data_dictionary_schema,
        "validated payload"
    );
    Ok(items)
}

fn has_context(obj: &Map<String, Value>) -> bool {
    obj.contains_key(RESO_CONTEXT_KEY) || obj.contains_key(ODATA_CONTEXT_KEY)
}

/// Keys containing `@` are annotations: either control information
/// (`@odata.nextLink`) or annotations on a field (`ListPrice@core`).
fn is_annotation(key: &str) -> bool {
    key.contains('@')
}

struct Walker<'v, 'c, S: ?Sized> {
    schema: &'v Schema,
    context: &'v ValidationContext<'c>,
    sink: &'v mut S,
}

impl<S: DefectSink + ?Sized> Walker<'_, '_, S> {
    fn visit_item(
        &mut self,
        resource_name: &str,
        resource: &ResourceSchema,
        item: &Map<String, Value>,
        path: &str,
    ) {
        for (key, value) in item {
            self.visit_property(resource_name, resource, key, value, path);
        }
    }

    fn visit_property(
        &mut self,
        resource_name: &str,
        resource: &ResourceSchema,
        key: &str,
        value: &Value,
        parent_path: &str,
    ) {
        if is_annotation(key) {
            return;
        }
        let path = child_path(parent_path, key);
        match resource.field(key) {
            Some(rule) => self.visit_field(resource_name, key, rule, value, &path),
            None if self.context.is_reso_data_dictionary_schema => {
                let message = format!(
                    "ADDITIONAL fields found that are not part of Data Dictionary {}",
                    self.context.version
                );
                self.record_error(resource_name, key, message, Occurrence::at(path));
            }
            None => {}
        }
    }

    fn visit_field(
        &mut self,
        resource_name: &str,
        field_name: &str,
        rule: &FieldRule,
        value: &Value,
        path: &str,
    ) {
        match &rule.kind {
            FieldKind::Expansion(expansion) => {
                self.visit_expansion(resource_name, field_name, expansion, value, path)
            }
            kind if value.is_null() => {
                if let (false, Some(expected)) = (rule.nullable, kind.expected_json_kind()) {
                    self.type_mismatch(resource_name, field_name, expected, false, value, path);
                }
            }
            FieldKind::Primitive(primitive) => {
                self.check_primitive(resource_name, field_name, rule.nullable, primitive, value, path)
            }
            FieldKind::PrimitiveList(primitive) => match value {
                Value::Array(items) => {
                    for (i, item) in items.iter().enumerate() {
                        let item_path = index_path(path, i);
                        self.check_primitive(resource_name, field_name, false, primitive, item, &item_path);
                    }
                }
                other => self.type_mismatch(
                    resource_name,
                    field_name,
                    JsonKind::Array,
                    rule.nullable,
                    other,
                    path,
                ),
            },
            FieldKind::Enum(rule_values) => match value {
                Value::String(s) => self.check_enum(resource_name, field_name, rule_values, s, path),
                other => self.type_mismatch(
                    resource_name,
                    field_name,
                    JsonKind::String,
                    rule.nullable,
                    other,
                    path,
                ),
            },
            FieldKind::StringList(rule_values) => match value {
                Value::String(s) => self.check_enum(resource_name, field_name, rule_values, s, path),
                Value::Array(items) => {
                    for (i, item) in items.iter().enumerate() {
                        let item_path = index_path(path, i);
                        match item {
                            Value::String(s) => {
                                self.check_enum(resource_name, field_name, rule_values, s, &item_path)
                            }
                            other => self.type_mismatch(
                                resource_name,
                                field_name,
                                JsonKind::String,
                                false,
                                other,
                                &item_path,
                            ),
                        }
                    }
                }
                other => self.type_mismatch(
                    resource_name,
                    field_name,
                    JsonKind::Array,
                    rule.nullable,
                    other,
                    path,
                ),
            },
        }
    }

    fn visit_expansion(
        &mut self,
        resource_name: &str,
        field_name: &str,
        expansion: &ExpansionRule,
        value: &Value,
        path: &str,
    ) {
        let Some(target) = self.schema.resource(&expansion.target_resource) else {
            tracing::warn!(
                resource = resource_name,
                field = field_name,
                target = %expansion.target_resource,
                "expansion target is not in the schema; skipping"
            );
            return;
        };
        let target_name = expansion.target_resource.as_str();

        match (expansion.is_collection, value) {
            (true, Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = index_path(path, i);
                    match item {
                        Value::Object(obj) => self.visit_item(target_name, target, obj, &item_path),
                        other => self.type_mismatch(
                            resource_name,
                            field_name,
                            JsonKind::Object,
                            false,
                            other,
                            &item_path,
                        ),
                    }
                }
            }
            (true, other) => {
                self.type_mismatch(resource_name, field_name, JsonKind::Array, false, other, path)
            }
            (false, Value::Null) => {}
            (false, Value::Object(obj)) => self.visit_item(target_name, target, obj, path),
            (false, other) => {
                self.type_mismatch(resource_name, field_name, JsonKind::Object, true, other, path)
            }
        }
    }

    fn check_primitive(
        &mut self,
        resource_name: &str,
        field_name: &str,
        nullable: bool,
        primitive: &PrimitiveRule,
        value: &Value,
        path: &str,
    ) {
        match primitive {
            PrimitiveRule::Any => {}
            PrimitiveRule::Boolean if value.is_boolean() => {}
            PrimitiveRule::Number if value.is_number() => {}
            PrimitiveRule::Boolean => {
                self.type_mismatch(resource_name, field_name, JsonKind::Boolean, nullable, value, path)
            }
            PrimitiveRule::Number => {
                self.type_mismatch(resource_name, field_name, JsonKind::Number, nullable, value, path)
            }
            PrimitiveRule::Integer(bounds) => match integer_value(value) {
                Some(n) => self.check_bounds(resource_name, field_name, bounds, n, path),
                None => self.type_mismatch(
                    resource_name,
                    field_name,
                    JsonKind::Integer,
                    nullable,
                    value,
                    path,
                ),
            },
            PrimitiveRule::String { max_length, format } => {
                let Some(s) = value.as_str() else {
                    self.type_mismatch(resource_name, field_name, JsonKind::String, nullable, value, path);
                    return;
                };
                if let Some(max) = *max_length {
                    if s.chars().count() as u64 > max {
                        self.max_length_exceeded(resource_name, field_name, max, path);
                    }
                }
                if let Some(format) = *format {
                    if !matches_format(format, s) {
                        self.record_error(
                            resource_name,
                            field_name,
                            format!("MUST match format \"{format}\""),
                            Occurrence::at(path),
                        );
                    }
                }
            }
        }
    }

    fn check_bounds(
        &mut self,
        resource_name: &str,
        field_name: &str,
        bounds: &IntegerBounds,
        n: i128,
        path: &str,
    ) {
        let message = if n > bounds.max {
            format!("MUST be <= {}", bounds.max)
        } else if n < bounds.min {
            format!("MUST be >= {}", bounds.min)
        } else {
            return;
        };
        self.record_error(resource_name, field_name, message, Occurrence::at(path));
    }

    fn max_length_exceeded(&mut self, resource_name: &str, field_name: &str, max: u64, path: &str) {
        let (severity, message) = if self.context.is_reso_data_dictionary_schema {
            (
                Severity::Error,
                format!("MUST have a maximum advertised length of {max} characters"),
            )
        } else {
            (
                Severity::Warning,
                format!("SHOULD have a maximum suggested length of {max} characters"),
            )
        };
        self.record(resource_name, field_name, severity, message, Occurrence::at(path));
    }

    /// Check one enumeration string. The whole string is tried first; only
    /// if it is not an allowed value is it split on `,` and each trimmed
    /// segment checked on its own.
    fn check_enum(
        &mut self,
        resource_name: &str,
        field_name: &str,
        rule: &EnumRule,
        raw: &str,
        path: &str,
    ) {
        let segments: Vec<&str> = if rule.allows(raw) || !raw.contains(',') {
            vec![raw]
        } else {
            raw.split(',').map(str::trim).collect()
        };

        for segment in segments {
            if rule.odata_identifiers && !is_simple_identifier(segment) {
                self.record_error(
                    resource_name,
                    field_name,
                    format!(
                        "INVALID OData identifier: {segment}. See OData Simple Identifiers: {ODATA_SIMPLE_IDENTIFIER_URL}"
                    ),
                    Occurrence::at(path).with_lookup_value(segment),
                );
            }
            if !rule.allows(segment) {
                self.enum_mismatch(resource_name, field_name, segment, path);
            }
        }
    }

    fn enum_mismatch(&mut self, resource_name: &str, field_name: &str, value: &str, path: &str) {
        let occurrence = Occurrence::at(path).with_lookup_value(value);
        if self.context.ignores_enumerations(resource_name, field_name) {
            let message = format!(
                "The following enumerations in the `{field_name}` Field were not advertised. This will fail in Data Dictionary 2.1"
            );
            self.record(resource_name, field_name, Severity::Warning, message, occurrence);
        } else {
            self.record_error(resource_name, field_name, ENUM_MISMATCH_MESSAGE, occurrence);
        }
    }

    fn type_mismatch(
        &mut self,
        resource_name: &str,
        field_name: &str,
        expected: JsonKind,
        or_null: bool,
        value: &Value,
        path: &str,
    ) {
        let message = must_be(expected, or_null, JsonKind::of(value));
        self.record_error(resource_name, field_name, message, Occurrence::at(path));
    }

    fn record_error(
        &mut self,
        resource_name: &str,
        field_name: &str,
        message: impl Into<String>,
        occurrence: Occurrence,
    ) {
        self.record(resource_name, field_name, Severity::Error, message, occurrence);
    }

    fn record(
        &mut self,
        resource_name: &str,
        field_name: &str,
        severity: Severity,
        message: impl Into<String>,
        occurrence: Occurrence,
    ) {
        self.sink
            .record(DefectKey::new(resource_name, field_name, severity, message), occurrence);
    }
}

fn must_be(expected: JsonKind, or_null: bool, found: JsonKind) -> String {
    let suffix = if or_null { " or null" } else { "" };
    format!("MUST be {expected}{suffix} but found {found}")
}

/// Integral value of a JSON number. Floats with no fractional part count.
///
/// Integer literals outside `i64`/`u64` reach us as `f64`, and
/// `-9223372036854775809` rounds to exactly `i64::MIN`. A float at or below
/// that boundary is therefore placed one below it, so it fails every
/// supported width. Only a float-syntax `-9223372036854775808.0` is
/// misjudged by this.
fn integer_value(value: &Value) -> Option<i128> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i128::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(i128::from(u));
    }
    let below_i64 = i128::from(i64::MIN) - 1;
    n.as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0)
        .map(|f| {
            let n = f as i128;
            if n <= i128::from(i64::MIN) {
                n.min(below_i64)
            } else {
                n
            }
        })
}

fn matches_format(format: StringFormat, s: &str) -> bool {
    match format {
        StringFormat::Date => chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
        StringFormat::DateTime => chrono::DateTime::parse_from_rfc3339(s).is_ok(),
        StringFormat::Time => chrono::NaiveTime::parse_from_str(s, "%H:%M:%S%.f").is_ok(),
        StringFormat::Uuid => uuid::Uuid::parse_str(s).is_ok(),
    }
}

/// JSON Pointer of `key` under `parent`.
fn child_path(parent: &str, key: &str) -> String {
    format!("{parent}/{}", PointerToken(key))
}

fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}/{index}")
}

struct PointerToken<'a>(&'a str);

impl fmt::Display for PointerToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '~' => f.write_str("~0")?,
                '/' => f.write_str("~1")?,
                c => fmt::Write::write_char(f, c)?,
            }
        }
        Ok(())
    }
}
