//! Shared helpers for hashbind integration tests
//!
//! PostgreSQL tests run against a throwaway container and are `#[ignore]`d
//! by default:
//!
//! ```bash
//! cargo test -p hashbind --test catalog_postgres -- --ignored
//! ```

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use anyhow::{Context, Result};
use hashbind::db::TableName;
use hashbind_common::fingerprint::fingerprint_bytes;
use hashbind_common::{FileDescriptor, Fingerprint};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::time::Duration;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tracing::info;

/// PostgreSQL container with a connected pool
pub struct TestPostgres {
    _container: ContainerAsync<Postgres>,
    pool: PgPool,
    connection_string: String,
}

impl TestPostgres {
    pub async fn start() -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .with_tag("16-alpine")
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container.get_host().await.context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let connection_string = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self {
            _container: container,
            pool,
            connection_string,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// Create a catalog table without a `filename` column and load `hashes`
    pub async fn create_catalog(&self, table: &str, hashes: &[Fingerprint]) -> Result<TableName> {
        sqlx::query(&format!(
            "CREATE TABLE {} (id SERIAL PRIMARY KEY, hash VARCHAR(32) NOT NULL UNIQUE)",
            table
        ))
        .execute(&self.pool)
        .await
        .context("Failed to create catalog table")?;

        for hash in hashes {
            sqlx::query(&format!("INSERT INTO {} (hash) VALUES ($1)", table))
                .bind(hash.as_str())
                .execute(&self.pool)
                .await
                .context("Failed to insert catalog record")?;
        }

        Ok(table.parse()?)
    }

    /// Committed filename for `hash`, read on a separate connection
    pub async fn filename_for(&self, table: &str, hash: &Fingerprint) -> Result<Option<String>> {
        let row: Option<Option<String>> =
            sqlx::query_scalar(&format!("SELECT filename FROM {} WHERE hash = $1", table))
                .bind(hash.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.flatten())
    }
}

pub fn init_test_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hashbind=debug,sqlx=warn,testcontainers=info")),
        )
        .with_test_writer()
        .try_init();
}

/// Write `files` (name, contents) into `dir` and return their fingerprints
pub fn write_corpus(dir: &Path, files: &[(&str, &str)]) -> Vec<Fingerprint> {
    files
        .iter()
        .map(|(name, body)| {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&path, body).unwrap();
            fingerprint_bytes(body.as_bytes())
        })
        .collect()
}

pub fn descriptors(dir: &Path, names: &[&str]) -> Vec<FileDescriptor> {
    names.iter().map(|n| FileDescriptor::from_path(dir.join(n))).collect()
}
