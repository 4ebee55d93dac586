//! Error types for hashbind

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for hashbind operations
pub type Result<T> = std::result::Result<T, HashbindError>;

/// Main error type for the shared library
#[derive(Error, Debug)]
pub enum HashbindError {
    /// A single file could not be read while fingerprinting it
    #[error("Failed to read '{}': {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid fingerprint '{0}': expected 32 hexadecimal characters")]
    InvalidFingerprint(String),
}

impl HashbindError {
    /// Create a file read error for `path`
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }
}
