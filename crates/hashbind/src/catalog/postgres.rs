//! PostgreSQL catalog
//!
//! The table name comes from configuration, so statements are built at
//! runtime from a validated [`TableName`]; all values are bound parameters.

use super::CatalogGateway;
use crate::db::{create_pool, DbConfig, DbError, DbResult, TableName};
use async_trait::async_trait;
use hashbind_common::Fingerprint;
use sqlx::{Connection, PgPool, Postgres, Transaction};
use tracing::{debug, info, warn};

/// Catalog session over a single PostgreSQL connection.
///
/// A transaction is opened lazily on the first statement after each commit,
/// so lookups see this session's pending assignments.
///
/// Writes run inside a savepoint. A failed write is rolled back to it and
/// leaves earlier assignments committable. Any other failed statement aborts
/// the transaction, and the next [`commit`](CatalogGateway::commit) rolls
/// back and reports [`DbError::TransactionAborted`].
pub struct PgCatalog {
    pool: PgPool,
    table: TableName,
    tx: Option<Transaction<'static, Postgres>>,
    aborted: bool,
}

impl PgCatalog {
    /// Connect using `config` and operate on `table`
    pub async fn connect(config: &DbConfig, table: TableName) -> DbResult<Self> {
        let pool = create_pool(config).await?;
        Ok(Self::from_pool(pool, table))
    }

    /// Wrap an existing pool; the pool should allow at least one connection
    pub fn from_pool(pool: PgPool, table: TableName) -> Self {
        Self {
            pool,
            table,
            tx: None,
            aborted: false,
        }
    }

    async fn tx(&mut self) -> DbResult<&mut Transaction<'static, Postgres>> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => self.pool.begin().await?,
        };
        Ok(self.tx.insert(tx))
    }

    /// Record a failure of a statement that ran directly in the transaction
    fn track<T>(&mut self, result: Result<T, sqlx::Error>) -> DbResult<T> {
        if result.is_err() && self.tx.is_some() {
            self.aborted = true;
        }
        Ok(result?)
    }
}

#[async_trait]
impl CatalogGateway for PgCatalog {
    async fn ensure_filename_column(&mut self) -> DbResult<()> {
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN IF NOT EXISTS filename TEXT UNIQUE",
            self.table
        );
        let tx = self.tx().await?;
        let result = sqlx::query(&sql).execute(&mut **tx).await;
        self.track(result)?;
        self.commit().await?;

        info!(table = %self.table, "Ensured filename column");
        Ok(())
    }

    async fn find_assigned_filename(&mut self, fingerprint: &Fingerprint) -> DbResult<Option<String>> {
        let sql = format!("SELECT filename FROM {} WHERE hash = $1", self.table);
        let tx = self.tx().await?;
        let result: Result<Option<Option<String>>, _> = sqlx::query_scalar(&sql)
            .bind(fingerprint.as_str())
            .fetch_optional(&mut **tx)
            .await;

        Ok(self.track(result)?.flatten())
    }

    async fn is_filename_taken(&mut self, filename: &str) -> DbResult<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE filename = $1)", self.table);
        let tx = self.tx().await?;
        let result: Result<bool, _> = sqlx::query_scalar(&sql)
            .bind(filename)
            .fetch_one(&mut **tx)
            .await;

        self.track(result)
    }

    async fn assign_filename(&mut self, fingerprint: &Fingerprint, filename: &str) -> DbResult<bool> {
        // `filename IS NULL` keeps a bound record from being overwritten by
        // another writer between our checks and this statement
        let sql = format!(
            "UPDATE {} SET filename = $1 WHERE hash = $2 AND filename IS NULL",
            self.table
        );
        let tx = self.tx().await?;
        let mut savepoint = Connection::begin(&mut **tx).await?;

        let result = sqlx::query(&sql)
            .bind(filename)
            .bind(fingerprint.as_str())
            .execute(&mut *savepoint)
            .await;

        match result {
            Ok(done) => {
                savepoint.commit().await?;
                Ok(done.rows_affected() > 0)
            },
            Err(e) => {
                if let Err(rollback) = savepoint.rollback().await {
                    warn!(error = %rollback, "Rollback to savepoint failed");
                    self.aborted = true;
                }
                Err(e.into())
            },
        }
    }

    async fn commit(&mut self) -> DbResult<()> {
        let Some(tx) = self.tx.take() else {
            return Ok(());
        };

        if std::mem::take(&mut self.aborted) {
            warn!("Transaction aborted by an earlier error, rolling back");
            tx.rollback().await?;
            return Err(DbError::TransactionAborted);
        }

        tx.commit().await?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn close(&mut self) -> DbResult<()> {
        self.aborted = false;
        if let Some(tx) = self.tx.take() {
            warn!("Closing catalog with uncommitted changes, rolling back");
            if let Err(e) = tx.rollback().await {
                warn!(error = %e, "Rollback failed");
            }
        }
        self.pool.close().await;
        Ok(())
    }
}
