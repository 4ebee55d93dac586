//! In-process catalog
//!
//! Mirrors the PostgreSQL catalog's behaviour: session reads see pending
//! writes, `filename` is unique, and only committed state survives `close`.
//! A failed write is rolled back on its own, as a savepoint would. Any other
//! failed statement aborts the session's transaction: later statements fail
//! and the next commit discards pending writes. Used to exercise the
//! reconciler without a database.

use super::CatalogGateway;
use crate::db::{DbError, DbResult};
use async_trait::async_trait;
use hashbind_common::Fingerprint;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Default, Clone)]
pub struct MemoryCatalog {
    /// State visible to this session, including uncommitted writes
    live: BTreeMap<Fingerprint, Option<String>>,
    /// State as of the last commit
    durable: BTreeMap<Fingerprint, Option<String>>,
    has_filename_column: bool,
    commits: usize,
    closed: bool,
    aborted: bool,
    fail_on: HashSet<String>,
    fail_lookup_on: HashSet<String>,
    fail_commit: bool,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-populated with unbound records for `fingerprints`
    pub fn with_records<I>(fingerprints: I) -> Self
    where
        I: IntoIterator<Item = Fingerprint>,
    {
        let mut catalog = Self::new();
        for fp in fingerprints {
            catalog.insert_record(fp, None);
        }
        catalog
    }

    /// Insert a committed record, as the external loader would
    pub fn insert_record(&mut self, fingerprint: Fingerprint, filename: Option<&str>) {
        let filename = filename.map(str::to_string);
        self.live.insert(fingerprint.clone(), filename.clone());
        self.durable.insert(fingerprint, filename);
    }

    /// Make `assign_filename` fail for `filename`, as a broken connection would
    pub fn fail_on_assign(&mut self, filename: impl Into<String>) {
        self.fail_on.insert(filename.into());
    }

    /// Make `is_filename_taken` fail for `filename`, aborting the transaction
    pub fn fail_on_lookup(&mut self, filename: impl Into<String>) {
        self.fail_lookup_on.insert(filename.into());
    }

    /// Make every `commit` fail
    pub fn fail_commits(&mut self) {
        self.fail_commit = true;
    }

    /// Committed filename for `fingerprint`
    pub fn durable_filename(&self, fingerprint: &Fingerprint) -> Option<&str> {
        self.durable.get(fingerprint).and_then(|f| f.as_deref())
    }

    /// Every committed (fingerprint, filename) binding
    pub fn durable_bindings(&self) -> BTreeMap<Fingerprint, String> {
        self.durable
            .iter()
            .filter_map(|(fp, name)| name.clone().map(|n| (fp.clone(), n)))
            .collect()
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn has_filename_column(&self) -> bool {
        self.has_filename_column
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Pretend the process restarted: a new session over the committed state
    pub fn reopen(&self) -> Self {
        Self {
            live: self.durable.clone(),
            durable: self.durable.clone(),
            has_filename_column: self.has_filename_column,
            ..Self::default()
        }
    }

    fn check_open(&self) -> DbResult<()> {
        if self.closed {
            return Err(DbError::config("catalog session is closed"));
        }
        if self.aborted {
            return Err(DbError::config("current transaction is aborted"));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogGateway for MemoryCatalog {
    async fn ensure_filename_column(&mut self) -> DbResult<()> {
        self.check_open()?;
        self.has_filename_column = true;
        Ok(())
    }

    async fn find_assigned_filename(&mut self, fingerprint: &Fingerprint) -> DbResult<Option<String>> {
        self.check_open()?;
        Ok(self.live.get(fingerprint).cloned().flatten())
    }

    async fn is_filename_taken(&mut self, filename: &str) -> DbResult<bool> {
        self.check_open()?;
        if self.fail_lookup_on.contains(filename) {
            self.aborted = true;
            return Err(DbError::config(format!("injected failure looking up '{}'", filename)));
        }
        Ok(self.live.values().any(|f| f.as_deref() == Some(filename)))
    }

    async fn assign_filename(&mut self, fingerprint: &Fingerprint, filename: &str) -> DbResult<bool> {
        self.check_open()?;
        if self.fail_on.contains(filename) {
            return Err(DbError::config(format!("injected failure assigning '{}'", filename)));
        }

        let taken_elsewhere = self
            .live
            .iter()
            .any(|(fp, f)| fp != fingerprint && f.as_deref() == Some(filename));
        if taken_elsewhere {
            return Err(DbError::duplicate("filename", filename));
        }

        match self.live.get_mut(fingerprint) {
            Some(slot) if slot.is_none() => {
                *slot = Some(filename.to_string());
                Ok(true)
            },
            _ => Ok(false),
        }
    }

    async fn commit(&mut self) -> DbResult<()> {
        if self.closed {
            return Err(DbError::config("catalog session is closed"));
        }
        if std::mem::take(&mut self.aborted) {
            self.live = self.durable.clone();
            return Err(DbError::TransactionAborted);
        }
        if self.fail_commit {
            return Err(DbError::config("injected commit failure"));
        }
        self.durable = self.live.clone();
        self.commits += 1;
        Ok(())
    }

    async fn close(&mut self) -> DbResult<()> {
        self.live = self.durable.clone();
        self.aborted = false;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use hashbind_common::fingerprint::fingerprint_bytes;

    #[tokio::test]
    async fn test_reads_see_pending_writes() {
        let fp = fingerprint_bytes(b"a");
        let mut catalog = MemoryCatalog::with_records([fp.clone()]);

        assert!(catalog.assign_filename(&fp, "a.txt").await.unwrap());
        assert_eq!(catalog.find_assigned_filename(&fp).await.unwrap().as_deref(), Some("a.txt"));
        assert!(catalog.is_filename_taken("a.txt").await.unwrap());
        assert_eq!(catalog.durable_filename(&fp), None);

        catalog.commit().await.unwrap();
        assert_eq!(catalog.durable_filename(&fp), Some("a.txt"));
        assert_eq!(catalog.commits(), 1);
    }

    #[tokio::test]
    async fn test_unique_filename_enforced() {
        let a = fingerprint_bytes(b"a");
        let b = fingerprint_bytes(b"b");
        let mut catalog = MemoryCatalog::with_records([a.clone(), b.clone()]);

        assert!(catalog.assign_filename(&a, "same.txt").await.unwrap());
        let err = catalog.assign_filename(&b, "same.txt").await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_bound_and_unknown_records_are_not_updated() {
        let a = fingerprint_bytes(b"a");
        let mut catalog = MemoryCatalog::new();
        catalog.insert_record(a.clone(), Some("first.txt"));

        assert!(!catalog.assign_filename(&a, "second.txt").await.unwrap());
        assert!(!catalog.assign_filename(&fingerprint_bytes(b"zz"), "other.txt").await.unwrap());
        assert_eq!(catalog.find_assigned_filename(&a).await.unwrap().as_deref(), Some("first.txt"));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_transaction_committable() {
        let a = fingerprint_bytes(b"a");
        let b = fingerprint_bytes(b"b");
        let mut catalog = MemoryCatalog::with_records([a.clone(), b.clone()]);
        catalog.fail_on_assign("b.txt");

        assert!(catalog.assign_filename(&a, "a.txt").await.unwrap());
        assert!(catalog.assign_filename(&b, "b.txt").await.is_err());

        catalog.commit().await.unwrap();
        assert_eq!(catalog.durable_filename(&a), Some("a.txt"));
        assert_eq!(catalog.durable_filename(&b), None);
    }

    #[tokio::test]
    async fn test_failed_lookup_aborts_transaction() {
        let a = fingerprint_bytes(b"a");
        let mut catalog = MemoryCatalog::with_records([a.clone()]);
        catalog.fail_on_lookup("broken.txt");

        assert!(catalog.assign_filename(&a, "a.txt").await.unwrap());
        assert!(catalog.is_filename_taken("broken.txt").await.is_err());
        assert!(catalog.find_assigned_filename(&a).await.is_err());

        let err = catalog.commit().await.unwrap_err();
        assert!(matches!(err, DbError::TransactionAborted));
        assert!(catalog.durable_bindings().is_empty());
        assert_eq!(catalog.commits(), 0);

        // The session is usable again after the rollback
        assert_eq!(catalog.find_assigned_filename(&a).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_close_discards_uncommitted() {
        let a = fingerprint_bytes(b"a");
        let mut catalog = MemoryCatalog::with_records([a.clone()]);
        catalog.assign_filename(&a, "a.txt").await.unwrap();
        catalog.close().await.unwrap();

        assert!(catalog.is_closed());
        assert!(catalog.durable_bindings().is_empty());
        assert!(catalog.find_assigned_filename(&a).await.is_err());
    }
}
