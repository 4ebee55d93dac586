//! Catalog gateway
//!
//! The reconciler talks to the catalog only through [`CatalogGateway`]. Each
//! method is one round-trip to the store, and reads observe the writes the
//! same session has made since its last commit.
//!
//! - [`PgCatalog`]: the PostgreSQL catalog used by `hashbind run`
//! - [`MemoryCatalog`]: an in-process catalog with the same semantics

use crate::db::DbResult;
use async_trait::async_trait;
use hashbind_common::Fingerprint;

pub mod memory;
pub mod postgres;

pub use memory::MemoryCatalog;
pub use postgres::PgCatalog;

/// Store operations needed to bind filenames to catalog records
#[async_trait]
pub trait CatalogGateway: Send {
    /// Add the unique, nullable `filename` column if it is missing.
    ///
    /// Idempotent; committed immediately.
    async fn ensure_filename_column(&mut self) -> DbResult<()>;

    /// Filename currently bound to `fingerprint`, or `None` if the fingerprint
    /// is unknown or unbound
    async fn find_assigned_filename(&mut self, fingerprint: &Fingerprint) -> DbResult<Option<String>>;

    /// Whether any record already holds `filename`
    async fn is_filename_taken(&mut self, filename: &str) -> DbResult<bool>;

    /// Bind `filename` to the record for `fingerprint`.
    ///
    /// Callers check [`find_assigned_filename`](Self::find_assigned_filename)
    /// and [`is_filename_taken`](Self::is_filename_taken) first. Returns
    /// `false` when no unbound record matches. A uniqueness violation is an
    /// error.
    async fn assign_filename(&mut self, fingerprint: &Fingerprint, filename: &str) -> DbResult<bool>;

    /// Make every write since the previous commit durable
    async fn commit(&mut self) -> DbResult<()>;

    /// Release the session. Uncommitted writes are discarded.
    async fn close(&mut self) -> DbResult<()>;
}
