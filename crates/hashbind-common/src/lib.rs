//! hashbind common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, fingerprinting, logging, and error handling for the hashbind
//! workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`HashbindError`] and the [`Result`] alias
//! - **Fingerprinting**: streamed MD5 digests of file contents
//! - **Logging**: `tracing` subscriber setup shared by every binary
//! - **Types**: [`FileDescriptor`] and [`FingerprintResult`]
//!
//! # Example
//!
//! ```no_run
//! use hashbind_common::fingerprint::fingerprint_file;
//! use hashbind_common::types::FileDescriptor;
//!
//! fn show(path: &str) -> hashbind_common::Result<()> {
//!     let file = FileDescriptor::from_path(path);
//!     let result = fingerprint_file(&file)?;
//!     println!("{}  {}", result.fingerprint, result.name);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{HashbindError, Result};
pub use types::{FileDescriptor, Fingerprint, FingerprintResult};
