//! # Validate Subcommand
//!
//! Validates one or more payload files against the schema generated from a
//! metadata report. All payloads accumulate into one error map, so paging
//! through a replicated resource yields a single report.
//!
//! The report is printed to stdout as JSON unless `--output` is given, in
//! which case only a one-line summary is printed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::Args;
use serde::Serialize;

use ddcert_core::{load_document, sha256_digest, CanonicalBytes, DataDictionaryVersion};
use ddcert_schema::{
    combine, generate, validate, ErrorMap, MetadataReport, Report, ValidationConfig,
    ValidationContext,
};

use crate::{emit_json, EXIT_ERRORS, EXIT_OK};

const DEFAULT_DESCRIPTION: &str = "Data Dictionary Validation Report";

/// Arguments for the `ddcert validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Metadata report (JSON or YAML).
    #[arg(long, value_name = "PATH")]
    pub metadata: PathBuf,

    /// Resource the payloads contain, e.g. `Property`.
    #[arg(long, value_name = "NAME")]
    pub resource: String,

    /// Data dictionary version being certified, e.g. `2.0`.
    #[arg(long = "version", value_name = "VER")]
    pub dd_version: DataDictionaryVersion,

    /// Per-field validation overrides (JSON or YAML).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Strict Data Dictionary mode: unadvertised fields and over-long
    /// strings are errors.
    #[arg(long)]
    pub strict: bool,

    /// Write the report to this file instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Emit canonical (JCS) JSON instead of pretty-printed JSON.
    #[arg(long)]
    pub canonical: bool,

    /// Payload files (JSON or YAML).
    #[arg(value_name = "PAYLOAD", required = true)]
    pub payloads: Vec<PathBuf>,
}

/// The report as written by the CLI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationReport {
    /// Metadata report description, or a default title.
    pub description: String,
    /// Data dictionary version the payloads were certified against.
    pub version: String,
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub generated_on: String,
    /// Totals and per-field defects.
    #[serde(flatten)]
    pub report: Report,
}

impl CertificationReport {
    fn new(description: Option<String>, version: &DataDictionaryVersion, report: Report) -> Self {
        Self {
            description: description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            version: version.to_string(),
            generated_on: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            report,
        }
    }
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 without errors, 1 if the report contains errors.
/// Unreadable inputs and fatal validation errors are returned as `Err`.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let metadata = MetadataReport::from_path(&args.metadata).with_context(|| {
        format!("failed to load metadata report {}", args.metadata.display())
    })?;
    let schema = generate(&metadata);
    tracing::info!(
        resources = schema.len(),
        fields = metadata.fields.len(),
        lookups = metadata.lookups.len(),
        "generated schema"
    );

    let config = args
        .config
        .as_deref()
        .map(ValidationConfig::from_path)
        .transpose()
        .context("failed to load validation config")?;

    let mut context = ValidationContext::new(&args.resource, args.dd_version.clone())
        .data_dictionary_schema(args.strict);
    if let Some(config) = &config {
        context = context.with_config(config);
    }

    let mut map = ErrorMap::new();
    for path in &args.payloads {
        let payload = load_document(path)
            .with_context(|| format!("failed to load payload {}", path.display()))?;
        let digest = sha256_digest(
            &CanonicalBytes::new(&payload).context("failed to canonicalize payload")?,
        );
        let items = validate(&schema, &payload, &context, &mut map)
            .with_context(|| format!("cannot validate {}", path.display()))?;
        tracing::info!(payload = %path.display(), %digest, items, "validated payload");
    }

    let report = CertificationReport::new(
        metadata.description.clone(),
        &args.dd_version,
        combine(&map),
    );
    tracing::info!(
        total_errors = report.report.total_errors,
        total_warnings = report.report.total_warnings,
        "validation complete"
    );

    emit_json(&report, args.output.as_deref(), args.canonical)?;
    if let Some(output) = &args.output {
        println!(
            "{}: {} error(s), {} warning(s) -> {}",
            args.resource,
            report.report.total_errors,
            report.report.total_warnings,
            output.display()
        );
    }

    if report.report.passed() {
        Ok(EXIT_OK)
    } else {
        Ok(EXIT_ERRORS)
    }
}
