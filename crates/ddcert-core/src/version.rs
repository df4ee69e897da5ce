//! # Data Dictionary Version
//!
//! Newtype for the data dictionary version a payload is certified against
//! (`1.7`, `2.0`, `2.1`, ...). The version selects validation config
//! overrides and appears verbatim in additional-field messages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VersionError;

/// A `<major>.<minor>` data dictionary version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataDictionaryVersion(String);

impl DataDictionaryVersion {
    /// Validate and wrap a version string.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] unless the input is two dot-separated,
    /// non-empty runs of ASCII digits.
    pub fn new(value: impl Into<String>) -> Result<Self, VersionError> {
        let value = value.into();
        let valid = match value.split_once('.') {
            Some((major, minor)) => is_digits(major) && is_digits(minor),
            None => false,
        };
        if valid {
            Ok(Self(value))
        } else {
            Err(VersionError { value })
        }
    }

    /// The version as written, e.g. `"2.0"`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for DataDictionaryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DataDictionaryVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DataDictionaryVersion {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DataDictionaryVersion> for String {
    fn from(v: DataDictionaryVersion) -> Self {
        v.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_known_versions() {
        for v in ["1.7", "2.0", "2.1", "10.12"] {
            assert_eq!(DataDictionaryVersion::new(v).unwrap().as_str(), v);
        }
    }

    #[test]
    fn test_rejects_malformed_versions() {
        for v in ["", "2", "2.", ".1", "2.0.1", "v2.0", "2.x"] {
            let err = DataDictionaryVersion::new(v).unwrap_err();
            assert_eq!(err.value, v);
        }
    }

    #[test]
    fn test_serde_validates_on_deserialize() {
        let ok: DataDictionaryVersion = serde_json::from_str("\"2.0\"").unwrap();
        assert_eq!(ok.to_string(), "2.0");
        assert!(serde_json::from_str::<DataDictionaryVersion>("\"two\"").is_err());
    }

    #[test]
    fn test_parses_from_str() {
        let v: DataDictionaryVersion = "1.7".parse().unwrap();
        assert_eq!(v, DataDictionaryVersion::new("1.7").unwrap());
    }
}
