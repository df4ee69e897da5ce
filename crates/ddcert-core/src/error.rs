//! # Error Types
//!
//! Shared error types for the leaf crate. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations.
//!
//! Load errors carry the path of the offending document and the reason it
//! could not be read, so callers can report them without extra context.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error while loading a JSON or YAML document from disk.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document could not be parsed or converted.
    #[error("document load error for '{path}': {reason}")]
    Load {
        /// Path (or label) of the document that failed to load.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// The document parsed but does not have the expected shape.
    #[error("document shape error for '{path}': {reason}")]
    Shape {
        /// Path (or label) of the document.
        path: String,
        /// What was wrong with the parsed document.
        reason: String,
    },
}

/// A data dictionary version string failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid data dictionary version '{value}': expected <major>.<minor>")]
pub struct VersionError {
    /// The rejected input.
    pub value: String,
}
