//! # ddcert-schema: Metadata-Driven Payload Validation
//!
//! Turns a metadata report into a structural schema and validates JSON
//! payloads against it, collecting every defect rather than stopping at the
//! first one.
//!
//! ## Pipeline
//!
//! ```text
//! MetadataReport --generate--> Schema
//! (Schema, payload) --validate--> ErrorMap   (caller-owned, reusable)
//! ErrorMap --combine--> Report
//! ```
//!
//! - [`generate`] is pure: regenerating after changing the report reflects
//!   the change exactly. Nothing is cached between calls.
//! - [`validate`](validate::validate) takes all of its settings through a
//!   per-call [`ValidationContext`]. There is no process-wide state.
//! - [`combine`] never consumes the map; callers may keep accumulating.
//!
//! ## Crate Policy
//!
//! - Depends only on `ddcert-core` internally.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod aggregate;
pub mod codegen;
pub mod config;
pub mod generate;
pub mod identifier;
pub mod metadata;
pub mod report;
pub mod schema;
pub mod types;
pub mod validate;

pub use aggregate::{
    DefectEntry, DefectKey, DefectSink, ErrorMap, Occurrence, SharedErrorMap, Severity,
};
pub use config::{FieldOptions, ValidationConfig};
pub use generate::generate;
pub use metadata::{FieldEntry, LookupEntry, MetadataReport, ResourceEntry};
pub use report::{combine, Report, ReportEntry, ReportItem};
pub use schema::{FieldKind, FieldRule, ResourceSchema, Schema};
pub use validate::{validate, ValidationContext, ValidationError};
