//! # ddcert-cli: CLI Tool for ddcert
//!
//! Provides the `ddcert` command-line interface over `ddcert-schema`.
//!
//! ## Subcommands
//!
//! - `ddcert validate`: validate payload files and emit the report.
//! - `ddcert schema`: export the generated schema as JSON Schema.
//!
//! ```bash
//! ddcert validate --metadata metadata-report.json --resource Property \
//!     --version 2.0 --strict page-1.json page-2.json
//! ddcert schema --metadata metadata-report.json --resource Property
//! ```
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | no errors (warnings allowed) |
//! | 1 | the report contains errors |
//! | 2 | operational failure: unreadable input or a fatal validation error |

pub mod export;
pub mod validate;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use ddcert_core::CanonicalBytes;

/// Exit code: clean run.
pub const EXIT_OK: u8 = 0;
/// Exit code: the report contains errors.
pub const EXIT_ERRORS: u8 = 1;
/// Exit code: the run could not complete.
pub const EXIT_OPERATIONAL: u8 = 2;

/// Serialize `value` to `output` (or stdout when `None`).
///
/// Canonical output is RFC 8785 (JCS) bytes with no trailing newline;
/// otherwise pretty-printed JSON followed by a newline.
pub fn emit_json<T: Serialize>(value: &T, output: Option<&Path>, canonical: bool) -> Result<()> {
    let bytes = if canonical {
        CanonicalBytes::new(value)
            .context("failed to canonicalize output")?
            .into_bytes()
    } else {
        let mut bytes = serde_json::to_vec_pretty(value).context("failed to serialize output")?;
        bytes.push(b'\n');
        bytes
    };

    match output {
        Some(path) => std::fs::write(path, &bytes)
            .with_context(|| format!("failed to write {}", path.display())),
        None => std::io::stdout()
            .lock()
            .write_all(&bytes)
            .context("failed to write to stdout"),
    }
}
