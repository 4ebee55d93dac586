//! hashbind
//!
//! Binds the names of files on disk to the catalog records that share their
//! content fingerprint.
//!
//! # Overview
//!
//! A catalog table holds one row per known file content, keyed by the MD5
//! `hash` of that content. `hashbind run` walks the configured directories,
//! fingerprints every file on a bounded worker pool and, for each result:
//!
//! - leaves the row alone if it already has a `filename`
//! - skips the file if another row already holds its name
//! - otherwise writes the file's base name into the row
//!
//! Assignments are committed in batches, with a final commit at the end.
//!
//! # Modules
//!
//! - [`enumerate`]: recursive file discovery
//! - [`worker`]: concurrent fingerprinting
//! - [`catalog`]: the store gateway and its PostgreSQL and in-memory backends
//! - [`reconcile`]: the single consumer that applies results to the catalog

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod catalog;
pub mod commands;
pub mod config;
pub mod db;
pub mod enumerate;
pub mod error;
pub mod progress;
pub mod reconcile;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use error::{CliError, Result};
pub use reconcile::{Outcome, ReconcileSummary, Reconciler};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hashbind - bind filenames to content-addressed catalog records
#[derive(Parser, Debug)]
#[command(name = "hashbind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the YAML configuration file
    #[arg(
        short,
        long,
        env = "HASHBIND_CONFIG",
        default_value = config::DEFAULT_CONFIG_PATH,
        global = true
    )]
    pub config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the CLI reference as Markdown
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fingerprint configured directories and bind filenames in the catalog
    Run {
        /// Concurrent fingerprint workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Assignments per commit
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Do not show progress bars
        #[arg(long)]
        no_progress: bool,
    },

    /// Fingerprint configured directories without touching the catalog
    Scan {
        /// Concurrent fingerprint workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Emit one JSON object per line
        #[arg(long)]
        json: bool,
    },
}
