//! # Defect Aggregation
//!
//! Defects are keyed by `(resource, field, severity, message)`. Recording a
//! defect whose key already exists appends an occurrence to the existing
//! entry instead of creating a second entry, so two bad values in the same
//! field collapse into one entry with two occurrences, while defects in two
//! different fields stay two entries.
//!
//! ## Ownership
//!
//! An [`ErrorMap`] is owned by the caller and threaded through validation
//! as `&mut`. It can be reused across successive validation calls to
//! accumulate results for several payloads. For concurrent validation into
//! one map, [`SharedErrorMap`] serializes each read-modify-write behind a
//! `parking_lot::Mutex`; alternatively give every worker its own map and
//! [`ErrorMap::merge`] them afterwards.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Defect severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Fails certification.
    Error,
    /// Reported but does not fail certification.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// Composite key identifying one kind of defect in one field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefectKey {
    /// Resource the defect is attributed to.
    pub resource_name: String,
    /// Field the defect is attributed to.
    pub field_name: String,
    /// Error or warning.
    pub severity: Severity,
    /// Human-readable message; identical messages merge.
    pub message: String,
}

impl DefectKey {
    /// Build a key.
    pub fn new(
        resource_name: impl Into<String>,
        field_name: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            resource_name: resource_name.into(),
            field_name: field_name.into(),
            severity,
            message: message.into(),
        }
    }
}

/// One place a defect was observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    /// The offending enumeration value, for value-level defects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_value: Option<String>,
    /// JSON Pointer to the offending value within the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Occurrence {
    /// An occurrence located at `path`.
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            lookup_value: None,
            path: Some(path.into()),
        }
    }

    /// Attach the offending lookup value.
    pub fn with_lookup_value(mut self, value: impl Into<String>) -> Self {
        self.lookup_value = Some(value.into());
        self
    }
}

/// All occurrences recorded under one key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefectEntry {
    /// Occurrences in recording order.
    pub occurrences: Vec<Occurrence>,
}

/// Anything defects can be recorded into.
pub trait DefectSink {
    /// Record one occurrence of the defect identified by `key`.
    fn record(&mut self, key: DefectKey, occurrence: Occurrence);
}

/// Ordered map of defects, keyed by [`DefectKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMap {
    entries: BTreeMap<DefectKey, DefectEntry>,
}

impl ErrorMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct defect entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up one entry.
    pub fn get(&self, key: &DefectKey) -> Option<&DefectEntry> {
        self.entries.get(key)
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&DefectKey, &DefectEntry)> {
        self.entries.iter()
    }

    /// Total occurrences recorded with `severity`.
    pub fn occurrence_count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.severity == severity)
            .map(|(_, e)| e.occurrences.len())
            .sum()
    }

    /// Fold `other` into this map. Occurrences from `other` are appended
    /// after the ones already present.
    pub fn merge(&mut self, other: ErrorMap) {
        for (key, entry) in other.entries {
            match self.entries.entry(key) {
                Entry::Occupied(mut existing) => {
                    existing.get_mut().occurrences.extend(entry.occurrences)
                }
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
            }
        }
    }
}

impl DefectSink for ErrorMap {
    fn record(&mut self, key: DefectKey, occurrence: Occurrence) {
        tracing::trace!(
            resource = %key.resource_name,
            field = %key.field_name,
            severity = %key.severity,
            message = %key.message,
            "recorded defect"
        );
        self.entries.entry(key).or_default().occurrences.push(occurrence);
    }
}

impl<'a> IntoIterator for &'a ErrorMap {
    type Item = (&'a DefectKey, &'a DefectEntry);
    type IntoIter = std::collections::btree_map::Iter<'a, DefectKey, DefectEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// An [`ErrorMap`] shared between concurrent validation calls.
///
/// Clones share the same map. Each `record` takes the lock for the
/// duration of one key's read-modify-write; the lock is never held across
/// a whole validation.
#[derive(Debug, Clone, Default)]
pub struct SharedErrorMap {
    inner: Arc<Mutex<ErrorMap>>,
}

impl SharedErrorMap {
    /// An empty shared map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the current contents out.
    pub fn snapshot(&self) -> ErrorMap {
        self.inner.lock().clone()
    }

    /// Take the accumulated map, leaving an empty one behind.
    pub fn take(&self) -> ErrorMap {
        std::mem::take(&mut *self.inner.lock())
    }
}

impl DefectSink for SharedErrorMap {
    fn record(&mut self, key: DefectKey, occurrence: Occurrence) {
        self.inner.lock().record(key, occurrence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENUM_MESSAGE: &str = "MUST be equal to one of the allowed values";

    fn enum_key(field: &str) -> DefectKey {
        DefectKey::new("Property", field, Severity::Error, ENUM_MESSAGE)
    }

    #[test]
    fn test_same_key_appends_occurrence() {
        let mut map = ErrorMap::new();
        map.record(
            enum_key("StandardStatus"),
            Occurrence::at("/StandardStatus").with_lookup_value("Bogus"),
        );
        map.record(
            enum_key("StandardStatus"),
            Occurrence::at("/StandardStatus").with_lookup_value("AlsoBogus"),
        );
        assert_eq!(map.len(), 1);
        let entry = map.get(&enum_key("StandardStatus")).unwrap();
        assert_eq!(entry.occurrences.len(), 2);
        assert_eq!(entry.occurrences[1].lookup_value.as_deref(), Some("AlsoBogus"));
        assert_eq!(map.occurrence_count(Severity::Error), 2);
    }

    #[test]
    fn test_different_fields_stay_separate() {
        let mut map = ErrorMap::new();
        map.record(enum_key("StandardStatus"), Occurrence::default());
        map.record(enum_key("PropertyType"), Occurrence::default());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_severity_is_part_of_the_key() {
        let mut map = ErrorMap::new();
        map.record(enum_key("City"), Occurrence::default());
        map.record(
            DefectKey::new("Property", "City", Severity::Warning, ENUM_MESSAGE),
            Occurrence::default(),
        );
        assert_eq!(map.len(), 2);
        assert_eq!(map.occurrence_count(Severity::Error), 1);
        assert_eq!(map.occurrence_count(Severity::Warning), 1);
    }

    #[test]
    fn test_merge_appends_in_order() {
        let mut a = ErrorMap::new();
        a.record(enum_key("StandardStatus"), Occurrence::at("/a"));
        let mut b = ErrorMap::new();
        b.record(enum_key("StandardStatus"), Occurrence::at("/b"));
        b.record(enum_key("PropertyType"), Occurrence::at("/c"));

        a.merge(b);
        assert_eq!(a.len(), 2);
        let paths: Vec<_> = a
            .get(&enum_key("StandardStatus"))
            .unwrap()
            .occurrences
            .iter()
            .map(|o| o.path.as_deref().unwrap())
            .collect();
        assert_eq!(paths, ["/a", "/b"]);
    }

    #[test]
    fn test_shared_map_accumulates_across_threads() {
        let shared = SharedErrorMap::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let mut sink = shared.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        sink.record(
                            enum_key("StandardStatus"),
                            Occurrence::at(format!("/value/{}", i * 50 + j)),
                        );
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let map = shared.take();
        assert_eq!(map.len(), 1);
        assert_eq!(map.occurrence_count(Severity::Error), 400);
        assert!(shared.snapshot().is_empty());
    }

    #[test]
    fn test_occurrence_serializes_without_absent_properties() {
        let json = serde_json::to_value(Occurrence::at("/Foo")).unwrap();
        assert_eq!(json, serde_json::json!({"path": "/Foo"}));
        let json = serde_json::to_value(Occurrence::default().with_lookup_value("X")).unwrap();
        assert_eq!(json, serde_json::json!({"lookupValue": "X"}));
    }
}
