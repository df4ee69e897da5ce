//! # ddcert-core: Foundational Types for ddcert
//!
//! Leaf crate of the ddcert workspace. It owns the small set of primitives
//! every other crate builds on and depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype for data dictionary versions.** `DataDictionaryVersion` has a
//!    validated constructor. Version strings are never passed around bare
//!    once they cross the library boundary.
//!
//! 2. **`CanonicalBytes` newtype.** Digests of payloads and reports are
//!    computed over RFC 8785 (JCS) bytes only, so two structurally equal
//!    documents always hash the same regardless of key order.
//!
//! 3. **One document loader.** Metadata reports, payloads and validation
//!    configs all load through [`document::load_document`], which accepts
//!    JSON or YAML by file extension.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ddcert-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod document;
pub mod error;
pub mod version;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use document::{load_document, parse_document, DocumentFormat};
pub use error::{CanonicalizationError, DocumentError, VersionError};
pub use version::DataDictionaryVersion;
