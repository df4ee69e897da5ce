//! # Schema Subcommand
//!
//! Exports the structural schema generated from a metadata report as a
//! JSON Schema (draft 2020-12) document.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use ddcert_schema::{generate, MetadataReport};

use crate::{emit_json, EXIT_OK};

/// Arguments for the `ddcert schema` subcommand.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Metadata report (JSON or YAML).
    #[arg(long, value_name = "PATH")]
    pub metadata: PathBuf,

    /// Root the document at this resource. Without it, only `$defs` are
    /// emitted.
    #[arg(long, value_name = "NAME")]
    pub resource: Option<String>,

    /// Permit fields the metadata does not advertise.
    #[arg(long)]
    pub additional_properties: bool,

    /// Write the document to this file instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Execute the schema subcommand.
pub fn run_schema(args: &SchemaArgs) -> Result<u8> {
    let metadata = MetadataReport::from_path(&args.metadata).with_context(|| {
        format!("failed to load metadata report {}", args.metadata.display())
    })?;
    let schema = generate(&metadata);

    let document = match &args.resource {
        Some(resource) => schema
            .json_schema_for(resource, args.additional_properties)
            .with_context(|| format!("resource '{resource}' is not defined by the metadata report"))?,
        None => schema.to_json_schema(args.additional_properties),
    };
    tracing::info!(
        resources = schema.len(),
        root = args.resource.as_deref().unwrap_or("-"),
        "exported JSON Schema"
    );

    emit_json(&document, args.output.as_deref(), false)?;
    Ok(EXIT_OK)
}
