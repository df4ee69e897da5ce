//! # Schema Generation
//!
//! Turns a [`MetadataReport`] into a structural [`Schema`]: one node per
//! advertised resource, one [`FieldRule`] per advertised field.
//!
//! Generation is a pure function of the report. There is no cache keyed on
//! report identity, so regenerating after pushing or popping a field or
//! lookup reflects the change exactly.

use std::collections::BTreeSet;

use crate::metadata::MetadataReport;
use crate::schema::{FieldRule, ResourceSchema, Schema};
use crate::types::{group_lookups, map_field};

/// Generate the structural schema for `report`.
///
/// Fields whose `resourceName` is not an advertised resource are skipped.
/// When a field name repeats within a resource, the last declaration wins.
pub fn generate(report: &MetadataReport) -> Schema {
    let lookups = group_lookups(&report.lookups);
    let resource_names: BTreeSet<&str> = report
        .resources
        .iter()
        .map(|r| r.resource_name.as_str())
        .collect();

    let mut schema = Schema::default();
    for name in &resource_names {
        let mut resource = ResourceSchema::default();
        for field in report.fields_for(name) {
            let rule = FieldRule {
                nullable: field.is_nullable(),
                kind: map_field(field, &lookups, &resource_names),
            };
            resource.fields.insert(field.field_name.clone(), rule);
        }
        tracing::debug!(resource = %name, fields = resource.len(), "generated resource schema");
        schema.resources.insert((*name).to_string(), resource);
    }

    for field in report
        .fields
        .iter()
        .filter(|f| !report.has_resource(&f.resource_name))
    {
        tracing::debug!(
            resource = %field.resource_name,
            field = %field.field_name,
            "field belongs to an unadvertised resource; skipping"
        );
    }

    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FieldEntry, LookupEntry, ResourceEntry};
    use crate::schema::{FieldKind, PrimitiveRule};

    fn report() -> MetadataReport {
        MetadataReport {
            resources: vec![
                ResourceEntry {
                    resource_name: "Property".into(),
                },
                ResourceEntry {
                    resource_name: "Member".into(),
                },
            ],
            fields: vec![
                FieldEntry::new("Property", "ListingKey", "Edm.String"),
                FieldEntry::new("Property", "StandardStatus", "StandardStatus"),
                FieldEntry::new("Property", "ListAgent", "Member"),
                FieldEntry::new("Member", "MemberKey", "Edm.String"),
                FieldEntry::new("Office", "OfficeKey", "Edm.String"),
            ],
            lookups: vec![LookupEntry::new("StandardStatus", "Active", "Edm.String")],
            ..MetadataReport::default()
        }
    }

    #[test]
    fn test_one_node_per_resource() {
        let schema = generate(&report());
        let names: Vec<_> = schema.resource_names().collect();
        assert_eq!(names, ["Member", "Property"]);
        assert_eq!(schema.resource("Property").unwrap().len(), 3);
        assert!(schema.resource("Office").is_none());
    }

    #[test]
    fn test_expansion_targets_resolve() {
        let schema = generate(&report());
        for (_, resource) in schema.resources() {
            for (_, rule) in resource.fields() {
                if let FieldKind::Expansion(exp) = &rule.kind {
                    assert!(schema.resource(&exp.target_resource).is_some());
                }
            }
        }
    }

    #[test]
    fn test_regeneration_reflects_pushed_and_popped_entries() {
        let mut report = report();
        let before = generate(&report);

        report
            .fields
            .push(FieldEntry::new("Member", "MemberFirstName", "Edm.String"));
        report
            .lookups
            .push(LookupEntry::new("StandardStatus", "Pending", "Edm.String"));
        let pushed = generate(&report);
        assert!(pushed.resource("Member").unwrap().field("MemberFirstName").is_some());
        match &pushed.resource("Property").unwrap().field("StandardStatus").unwrap().kind {
            FieldKind::Enum(rule) => assert!(rule.allows("Pending")),
            other => panic!("Expected Enum, got: {other:?}"),
        }

        report.fields.pop();
        report.lookups.pop();
        assert_eq!(generate(&report), before);
    }

    #[test]
    fn test_generation_does_not_touch_the_report() {
        let report = report();
        let copy = report.clone();
        let _ = generate(&report);
        assert_eq!(report, copy);
    }

    #[test]
    fn test_last_duplicate_declaration_wins() {
        let mut report = report();
        report
            .fields
            .push(FieldEntry::new("Property", "ListingKey", "Edm.Int32"));
        let schema = generate(&report);
        let rule = schema.resource("Property").unwrap().field("ListingKey").unwrap();
        assert!(matches!(rule.kind, FieldKind::Primitive(PrimitiveRule::Integer(_))));
    }
}
