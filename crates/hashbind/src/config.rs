//! Configuration management
//!
//! Settings come from a YAML file, then environment variables, then CLI flags,
//! each layer overriding the previous one.

use crate::db::{DbConfig, TableName, DEFAULT_DATABASE_URL};
use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Default number of concurrent fingerprint workers.
pub const DEFAULT_WORKERS: usize = 8;

/// Default number of assignments between commits.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// On-disk layout of the configuration file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    table_name: Option<String>,
    #[serde(default)]
    directories: Vec<PathBuf>,
    workers: Option<usize>,
    batch_size: Option<usize>,
    #[serde(default)]
    follow_links: bool,
    database_url: Option<String>,
}

/// Resolved configuration for a reconciliation run
#[derive(Debug, Clone)]
pub struct Config {
    /// Catalog table holding `hash` and `filename`
    pub table: TableName,

    /// Roots to scan, in order
    pub directories: Vec<PathBuf>,

    /// Concurrent fingerprint workers
    pub workers: usize,

    /// Assignments between commits
    pub batch_size: usize,

    /// Descend into symlinked directories
    pub follow_links: bool,

    pub database: DbConfig,
}

/// Values supplied on the command line, applied last
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub workers: Option<usize>,
    pub batch_size: Option<usize>,
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CliError::config(format!("{} must be a positive integer, got '{}'", key, value))),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load the configuration file at `path`, apply environment and CLI
    /// overrides, and validate the result.
    pub fn load(path: impl AsRef<Path>, overrides: &Overrides) -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("cannot read config file '{}': {}", path.display(), e))
        })?;

        Self::from_yaml(&raw, overrides)
    }

    /// Build a configuration from YAML text plus overrides
    pub fn from_yaml(raw: &str, overrides: &Overrides) -> Result<Self> {
        let file: FileConfig = serde_yaml::from_str(raw)?;

        let table_name = file
            .table_name
            .ok_or_else(|| CliError::config("missing 'tableName'"))?;
        let table: TableName = table_name.parse()?;

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .or(file.database_url)
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let workers = overrides
            .workers
            .or(env_usize("HASHBIND_WORKERS")?)
            .or(file.workers)
            .unwrap_or(DEFAULT_WORKERS);

        let batch_size = overrides
            .batch_size
            .or(env_usize("HASHBIND_BATCH_SIZE")?)
            .or(file.batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE);

        let config = Config {
            table,
            directories: file.directories,
            workers,
            batch_size,
            follow_links: file.follow_links,
            database: DbConfig::new(database_url),
        };

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.directories.is_empty() {
            return Err(CliError::config("no 'directories' configured"));
        }

        if self.workers == 0 {
            return Err(CliError::config("workers must be greater than 0"));
        }

        if self.batch_size == 0 {
            return Err(CliError::config("batchSize must be greater than 0"));
        }

        if self.database.url.is_empty() {
            return Err(CliError::config("database URL cannot be empty"));
        }

        Ok(())
    }
}
