//! # Report Builder
//!
//! Flattens an [`ErrorMap`] into the serializable [`Report`]: one item per
//! `(resource, field)` pair that has at least one defect, with errors and
//! warnings listed separately.
//!
//! Totals count occurrences, not entries: two bad values in one field are
//! one entry with two occurrences and contribute `2` to `totalErrors`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{ErrorMap, Occurrence, Severity};

/// The final validation report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Error occurrences across all items.
    pub total_errors: usize,
    /// Warning occurrences across all items.
    pub total_warnings: usize,
    /// Per-field detail, ordered by resource then field.
    pub items: Vec<ReportItem>,
}

impl Report {
    /// True if no errors were recorded. Warnings do not count.
    pub fn passed(&self) -> bool {
        self.total_errors == 0
    }
}

/// Defects of one field of one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportItem {
    /// Resource the defects were attributed to.
    pub resource_name: String,
    /// Field within that resource.
    pub field_name: String,
    /// Error entries, ordered by message.
    pub errors: Vec<ReportEntry>,
    /// Warning entries, ordered by message.
    pub warnings: Vec<ReportEntry>,
}

/// One message and every place it was observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    /// The defect message shared by every occurrence.
    pub message: String,
    /// Occurrences in the order they were recorded.
    pub occurrences: Vec<Occurrence>,
}

/// Build the report for `map`. The map is left untouched and may keep
/// accumulating afterwards.
pub fn combine(map: &ErrorMap) -> Report {
    let mut items: BTreeMap<(&str, &str), ReportItem> = BTreeMap::new();

    // Keys are ordered (resource, field, severity, message), so entries
    // within an item arrive sorted by message.
    for (key, entry) in map {
        let item = items
            .entry((key.resource_name.as_str(), key.field_name.as_str()))
            .or_insert_with(|| ReportItem {
                resource_name: key.resource_name.clone(),
                field_name: key.field_name.clone(),
                ..ReportItem::default()
            });
        let report_entry = ReportEntry {
            message: key.message.clone(),
            occurrences: entry.occurrences.clone(),
        };
        match key.severity {
            Severity::Error => item.errors.push(report_entry),
            Severity::Warning => item.warnings.push(report_entry),
        }
    }

    let report = Report {
        total_errors: map.occurrence_count(Severity::Error),
        total_warnings: map.occurrence_count(Severity::Warning),
        items: items.into_values().collect(),
    };
    tracing::debug!(
        items = report.items.len(),
        total_errors = report.total_errors,
        total_warnings = report.total_warnings,
        "combined report"
    );
    report
}
