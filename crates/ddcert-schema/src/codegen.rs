//! # JSON Schema Export
//!
//! Renders a structural [`Schema`] as a JSON Schema (draft 2020-12)
//! document so the same rules can be handed to tooling outside this crate.
//! Each resource becomes one `$defs` entry; expansions are `$ref`s between
//! entries, so self-referencing resources export without unrolling.
//!
//! The export is an approximation of the walker's rules, not a
//! replacement for it:
//!
//! - keys containing `@` are always permitted via `patternProperties`;
//! - enumerations check full-string membership only (comma-separated
//!   lists are not split);
//! - OData identifier grammar on legacy enumerations is not expressed;
//! - `maxLength` is always a hard constraint.

use serde_json::{json, Map, Value};

use crate::schema::{EnumRule, FieldKind, FieldRule, JsonKind, PrimitiveRule, ResourceSchema, Schema};

/// Dialect declared by exported documents.
pub const JSON_SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Pattern matching annotation and control-information keys.
const ANNOTATION_PATTERN: &str = "@";

impl Schema {
    /// Export every resource under `$defs`.
    ///
    /// With `additional_properties == false`, resource objects reject
    /// unadvertised fields, matching strict Data Dictionary mode.
    pub fn to_json_schema(&self, additional_properties: bool) -> Value {
        let defs: Map<String, Value> = self
            .resources()
            .map(|(name, resource)| {
                (
                    name.to_string(),
                    resource_schema(resource, additional_properties),
                )
            })
            .collect();
        json!({
            "$schema": JSON_SCHEMA_DIALECT,
            "$defs": defs,
        })
    }

    /// Export every resource and root the document at `resource_name`.
    ///
    /// Returns `None` if the resource is not defined.
    pub fn json_schema_for(&self, resource_name: &str, additional_properties: bool) -> Option<Value> {
        self.resource(resource_name)?;
        let mut document = self.to_json_schema(additional_properties);
        if let Value::Object(root) = &mut document {
            root.insert("$ref".into(), Value::String(def_ref(resource_name)));
        }
        Some(document)
    }
}

fn def_ref(resource_name: &str) -> String {
    format!("#/$defs/{}", resource_name.replace('~', "~0").replace('/', "~1"))
}

fn resource_schema(resource: &ResourceSchema, additional_properties: bool) -> Value {
    let properties: Map<String, Value> = resource
        .fields()
        .map(|(name, rule)| (name.to_string(), field_schema(rule)))
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "patternProperties": { ANNOTATION_PATTERN: {} },
        "additionalProperties": additional_properties,
    })
}

fn field_schema(rule: &FieldRule) -> Value {
    match &rule.kind {
        FieldKind::Expansion(expansion) if expansion.is_collection => json!({
            "type": "array",
            "items": { "$ref": def_ref(&expansion.target_resource) },
        }),
        FieldKind::Expansion(expansion) => json!({
            "anyOf": [
                { "$ref": def_ref(&expansion.target_resource) },
                { "type": "null" },
            ]
        }),
        FieldKind::Enum(values) => enum_schema(values, rule.nullable),
        FieldKind::StringList(values) => {
            let mut any_of = vec![
                json!({ "type": "array", "items": enum_schema(values, false) }),
                enum_schema(values, false),
            ];
            if rule.nullable {
                any_of.push(json!({ "type": "null" }));
            }
            json!({ "anyOf": any_of })
        }
        FieldKind::Primitive(primitive) => primitive_schema(primitive, rule.nullable),
        FieldKind::PrimitiveList(primitive) => json!({
            "type": type_keyword(JsonKind::Array, rule.nullable),
            "items": primitive_schema(primitive, false),
        }),
    }
}

fn enum_schema(rule: &EnumRule, nullable: bool) -> Value {
    let mut values: Vec<Value> = rule
        .allowed_values
        .iter()
        .map(|v| Value::String(v.clone()))
        .collect();
    if nullable {
        values.push(Value::Null);
    }
    json!({ "enum": values })
}

fn primitive_schema(primitive: &PrimitiveRule, nullable: bool) -> Value {
    let kind = match primitive {
        PrimitiveRule::Any => return json!({}),
        PrimitiveRule::String { .. } => JsonKind::String,
        PrimitiveRule::Boolean => JsonKind::Boolean,
        PrimitiveRule::Integer(_) => JsonKind::Integer,
        PrimitiveRule::Number => JsonKind::Number,
    };

    let mut schema = Map::new();
    schema.insert("type".into(), type_keyword(kind, nullable));
    match primitive {
        PrimitiveRule::String { max_length, format } => {
            if let Some(max) = max_length {
                schema.insert("maxLength".into(), Value::from(*max));
            }
            if let Some(format) = format {
                schema.insert("format".into(), Value::from(format.as_str()));
            }
        }
        PrimitiveRule::Integer(bounds) => {
            schema.insert("minimum".into(), integer_literal(bounds.min));
            schema.insert("maximum".into(), integer_literal(bounds.max));
        }
        _ => {}
    }
    Value::Object(schema)
}

fn type_keyword(kind: JsonKind, nullable: bool) -> Value {
    if nullable {
        json!([kind.as_str(), "null"])
    } else {
        json!(kind.as_str())
    }
}

/// Bounds never exceed the `i64`/`u64` ranges; the float fallback only
/// covers values outside both.
fn integer_literal(n: i128) -> Value {
    if let Ok(i) = i64::try_from(n) {
        Value::from(i)
    } else if let Ok(u) = u64::try_from(n) {
        Value::from(u)
    } else {
        Value::from(n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::generate;
    use crate::metadata::{FieldEntry, LookupEntry, MetadataReport, ResourceEntry};

    fn schema() -> Schema {
        generate(&MetadataReport {
            resources: ["Property", "Member"]
                .into_iter()
                .map(|r| ResourceEntry {
                    resource_name: r.into(),
                })
                .collect(),
            fields: vec![
                FieldEntry {
                    max_length: Some(5),
                    ..FieldEntry::new("Property", "City", "Edm.String")
                },
                FieldEntry::new("Property", "BedroomsTotal", "Edm.Int32"),
                FieldEntry::new("Property", "RoomCounts", "Collection(Edm.Int32)"),
                FieldEntry::new("Property", "StandardStatus", "StandardStatus"),
                FieldEntry {
                    is_collection: Some(true),
                    ..FieldEntry::new("Property", "Appliances", "Appliances")
                },
                FieldEntry::new("Property", "ListAgent", "Member"),
                FieldEntry::new("Property", "Agents", "Collection(Member)"),
                FieldEntry::new("Member", "MemberKey", "Edm.String"),
                FieldEntry::new("Member", "MemberOffice", "Member"),
                FieldEntry {
                    nullable: Some(false),
                    ..FieldEntry::new("Member", "MemberActiveYN", "Edm.Boolean")
                },
            ],
            lookups: vec![
                LookupEntry::new("StandardStatus", "Active", "Edm.String"),
                LookupEntry::new("Appliances", "Dishwasher", "Edm.String"),
                LookupEntry::new("Appliances", "Oven", "Edm.String"),
            ],
            ..MetadataReport::default()
        })
    }

    fn compile(document: &Value) -> jsonschema::Validator {
        jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .build(document)
            .unwrap()
    }

    #[test]
    fn test_export_compiles_and_accepts_valid_payloads() {
        let document = schema().json_schema_for("Property", false).unwrap();
        let validator = compile(&document);
        let valid = json!({
            "@reso.context": "urn:reso:metadata:2.0:resource:property",
            "City": "Miami",
            "BedroomsTotal": 3,
            "StandardStatus": "Active",
            "Appliances": ["Dishwasher", "Oven"],
            "ListAgent": {"MemberKey": "M1", "MemberActiveYN": true, "MemberOffice": null},
            "Agents": [],
            "City@core": 7
        });
        assert!(validator.is_valid(&valid));
    }

    #[test]
    fn test_export_rejects_structural_defects() {
        let validator = compile(&schema().json_schema_for("Property", false).unwrap());
        for invalid in [
            json!({"City": "Fort Lauderdale"}),
            json!({"BedroomsTotal": 4294967297u64}),
            json!({"StandardStatus": "Bogus"}),
            json!({"Agents": null}),
            json!({"ListAgent": {"MemberActiveYN": null}}),
            json!({"ListAgent": {"MemberOffice": {"Foo": 1}}}),
            json!({"Foo": "bar"}),
        ] {
            assert!(!validator.is_valid(&invalid), "{invalid}");
        }
    }

    #[test]
    fn test_additional_properties_toggle() {
        let lenient = compile(&schema().json_schema_for("Property", true).unwrap());
        assert!(lenient.is_valid(&json!({"Foo": "bar"})));
    }

    #[test]
    fn test_integer_bounds_are_exported() {
        let document = schema().to_json_schema(true);
        let bedrooms = &document["$defs"]["Property"]["properties"]["BedroomsTotal"];
        assert_eq!(bedrooms["maximum"], json!(4_294_967_295u64));
        assert_eq!(bedrooms["minimum"], json!(-2_147_483_648i64));
        assert_eq!(bedrooms["type"], json!(["integer", "null"]));
    }

    #[test]
    fn test_primitive_collections_export_item_rules() {
        let document = schema().json_schema_for("Property", false).unwrap();
        assert_eq!(
            document["$defs"]["Property"]["properties"]["RoomCounts"],
            json!({
                "type": ["array", "null"],
                "items": {
                    "type": "integer",
                    "minimum": -2_147_483_648i64,
                    "maximum": 4_294_967_295u64
                }
            })
        );

        let validator = compile(&document);
        assert!(validator.is_valid(&json!({"RoomCounts": [1, 2, 3]})));
        assert!(validator.is_valid(&json!({"RoomCounts": null})));
        for invalid in [
            json!({"RoomCounts": 3}),
            json!({"RoomCounts": ["3"]}),
            json!({"RoomCounts": [4294967296u64]}),
        ] {
            assert!(!validator.is_valid(&invalid), "{invalid}");
        }
    }

    #[test]
    fn test_unknown_root_resource_is_none() {
        assert!(schema().json_schema_for("Office", true).is_none());
    }

    #[test]
    fn test_every_resource_is_defined() {
        let document = schema().to_json_schema(false);
        assert_eq!(document["$schema"], json!(JSON_SCHEMA_DIALECT));
        let defs = document["$defs"].as_object().unwrap();
        assert_eq!(defs.keys().collect::<Vec<_>>(), ["Member", "Property"]);
    }
}
