//! # Type Mapper
//!
//! Maps a field's declared metadata type to a [`FieldKind`]. Declared types
//! are one of:
//!
//! - an `Edm.*` primitive (strings, booleans, fixed-width integers, numbers,
//!   dates and times, GUIDs);
//! - the name of a lookup group, which makes the field an enumeration;
//! - the name of a resource, which makes the field an expansion.
//!
//! Any of these may be written `Collection(<type>)` to mark a multi-valued
//! field; the field's `isCollection` flag has the same effect.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::metadata::{FieldEntry, LookupEntry};
use crate::schema::{
    EnumRule, ExpansionRule, FieldKind, IntegerBounds, PrimitiveRule, StringFormat,
};

pub const EDM_STRING: &str = "Edm.String";
pub const EDM_BOOLEAN: &str = "Edm.Boolean";
pub const EDM_BYTE: &str = "Edm.Byte";
pub const EDM_SBYTE: &str = "Edm.SByte";
pub const EDM_INT16: &str = "Edm.Int16";
pub const EDM_INT32: &str = "Edm.Int32";
pub const EDM_INT64: &str = "Edm.Int64";
pub const EDM_DECIMAL: &str = "Edm.Decimal";
pub const EDM_DOUBLE: &str = "Edm.Double";
pub const EDM_SINGLE: &str = "Edm.Single";
pub const EDM_DATE: &str = "Edm.Date";
pub const EDM_DATE_TIME_OFFSET: &str = "Edm.DateTimeOffset";
pub const EDM_TIME_OF_DAY: &str = "Edm.TimeOfDay";
pub const EDM_GUID: &str = "Edm.Guid";

/// The values of one lookup group, ready to be shared between fields.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupGroup {
    /// Every value declared for the group.
    pub values: Arc<BTreeSet<String>>,
    /// The group is a legacy OData enumeration (underlying type other than
    /// `Edm.String`), so its values must be OData simple identifiers.
    pub odata_identifiers: bool,
}

/// Group lookups by `lookupName`.
///
/// A group is a string enumeration only if all of its values are typed
/// `Edm.String`.
pub fn group_lookups(lookups: &[LookupEntry]) -> BTreeMap<String, LookupGroup> {
    let mut values: BTreeMap<&str, (BTreeSet<String>, bool)> = BTreeMap::new();
    for lookup in lookups {
        let entry = values
            .entry(lookup.lookup_name.as_str())
            .or_insert_with(|| (BTreeSet::new(), false));
        entry.0.insert(lookup.lookup_value.clone());
        entry.1 |= lookup.type_name != EDM_STRING;
    }
    values
        .into_iter()
        .map(|(name, (set, legacy))| {
            (
                name.to_string(),
                LookupGroup {
                    values: Arc::new(set),
                    odata_identifiers: legacy,
                },
            )
        })
        .collect()
}

/// Split `Collection(T)` into `(T, true)`; anything else is `(t, false)`.
pub fn strip_collection(type_name: &str) -> (&str, bool) {
    match type_name
        .strip_prefix("Collection(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (inner.trim(), true),
        None => (type_name, false),
    }
}

/// Resolve the rule kind of `field`.
///
/// `lookups` are the grouped lookup values and `resources` the names of
/// every advertised resource.
pub fn map_field(
    field: &FieldEntry,
    lookups: &BTreeMap<String, LookupGroup>,
    resources: &BTreeSet<&str>,
) -> FieldKind {
    let (inner, wrapped) = strip_collection(&field.type_name);
    let multi = wrapped || field.is_collection.unwrap_or(false);

    let target = [Some(inner), field.expansion_type.as_deref()]
        .into_iter()
        .flatten()
        .map(|t| strip_collection(t).0)
        .find(|t| resources.contains(t));

    if let Some(target) = target {
        return FieldKind::Expansion(ExpansionRule {
            target_resource: target.to_string(),
            is_collection: multi,
        });
    }

    if field.is_expansion == Some(true) {
        tracing::warn!(
            resource = %field.resource_name,
            field = %field.field_name,
            declared_type = %field.type_name,
            "expansion field names no advertised resource; accepting any value"
        );
        return FieldKind::Primitive(PrimitiveRule::Any);
    }

    if let Some(group) = lookups.get(inner) {
        let rule = EnumRule {
            lookup_name: inner.to_string(),
            allowed_values: Arc::clone(&group.values),
            odata_identifiers: group.odata_identifiers,
        };
        return if multi {
            FieldKind::StringList(rule)
        } else {
            FieldKind::Enum(rule)
        };
    }

    let primitive = map_primitive(inner, field.max_length).unwrap_or_else(|| {
        tracing::warn!(
            resource = %field.resource_name,
            field = %field.field_name,
            declared_type = %field.type_name,
            "unrecognized field type; accepting any value"
        );
        PrimitiveRule::Any
    });
    if multi {
        FieldKind::PrimitiveList(primitive)
    } else {
        FieldKind::Primitive(primitive)
    }
}

/// Map an `Edm.*` type name. `max_length` only applies to `Edm.String`.
pub fn map_primitive(type_name: &str, max_length: Option<u64>) -> Option<PrimitiveRule> {
    let string = |format| PrimitiveRule::String {
        max_length: None,
        format: Some(format),
    };
    let rule = match type_name {
        EDM_STRING => PrimitiveRule::String {
            max_length,
            format: None,
        },
        EDM_BOOLEAN => PrimitiveRule::Boolean,
        EDM_BYTE => PrimitiveRule::Integer(IntegerBounds::BYTE),
        EDM_SBYTE => PrimitiveRule::Integer(IntegerBounds::SBYTE),
        EDM_INT16 => PrimitiveRule::Integer(IntegerBounds::for_width(16)),
        EDM_INT32 => PrimitiveRule::Integer(IntegerBounds::for_width(32)),
        EDM_INT64 => PrimitiveRule::Integer(IntegerBounds::for_width(64)),
        EDM_DECIMAL | EDM_DOUBLE | EDM_SINGLE => PrimitiveRule::Number,
        EDM_DATE => string(StringFormat::Date),
        EDM_DATE_TIME_OFFSET => string(StringFormat::DateTime),
        EDM_TIME_OF_DAY => string(StringFormat::Time),
        EDM_GUID => string(StringFormat::Uuid),
        _ => return None,
    };
    Some(rule)
}
