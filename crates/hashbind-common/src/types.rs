//! Common types used across hashbind

use crate::error::HashbindError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Number of hex characters in a fingerprint (128-bit MD5)
pub const FINGERPRINT_LEN: usize = 32;

/// Content fingerprint of a file
///
/// Always holds exactly [`FINGERPRINT_LEN`] lowercase hex characters, which is
/// the format the catalog stores in its `hash` column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    pub(crate) fn from_digest(digest: md5::Digest) -> Self {
        Self(format!("{:x}", digest))
    }

    /// Hex representation as stored in the catalog
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Fingerprint {
    type Err = HashbindError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() == FINGERPRINT_LEN && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(trimmed.to_ascii_lowercase()))
        } else {
            Err(HashbindError::InvalidFingerprint(s.to_string()))
        }
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = HashbindError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A regular file discovered under one of the configured roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Full path as produced by the directory walk
    pub path: PathBuf,

    /// Base name, the value written to the catalog's `filename` column
    pub name: String,
}

impl FileDescriptor {
    /// Build a descriptor from a path, deriving the base name.
    ///
    /// Names that are not valid UTF-8 are converted lossily.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = base_name(&path);
        Self { path, name }
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Output of the fingerprinter for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintResult {
    pub fingerprint: Fingerprint,
    pub name: String,
    pub path: PathBuf,
}
