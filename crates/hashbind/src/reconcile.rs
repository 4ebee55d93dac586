//! Filename reconciliation
//!
//! Binds the base name of each fingerprinted file to the catalog record with
//! the same fingerprint. Two invariants are kept against the catalog:
//!
//! - a fingerprint is bound to at most one filename, and never rebound
//! - a filename is held by at most one fingerprint
//!
//! Fingerprints are computed in parallel (see [`crate::worker`]) but every
//! catalog interaction happens here, one result at a time, so each
//! check-then-write sequence completes before the next begins. Across
//! processes the store's unique constraint is the last line of defence.
//!
//! When two files share a name, whichever finishes fingerprinting first wins
//! the name. Completion order is nondeterministic, so so is the winner.

use crate::catalog::CatalogGateway;
use crate::db::DbResult;
use crate::worker::fingerprint_stream;
use futures::{pin_mut, StreamExt};
use hashbind_common::{FileDescriptor, FingerprintResult};
use indicatif::ProgressBar;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Terminal state of one fingerprint result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The fingerprint already has a filename; nothing to do
    DuplicateHash,
    /// Another fingerprint already holds this filename
    FilenameConflict,
    /// No unbound catalog record has this fingerprint
    UnknownFingerprint,
    /// The filename was bound to the record
    Committed,
}

/// Tallies for one reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub fingerprinted: usize,
    pub read_failures: usize,
    pub duplicate_hashes: usize,
    pub filename_conflicts: usize,
    pub unknown_fingerprints: usize,
    /// Rows updated; also the counter that drives batch commits
    pub updated: usize,
    pub commits: usize,
    /// Cancellation was requested before every file was submitted
    pub cancelled: bool,
}

impl ReconcileSummary {
    fn record(&mut self, outcome: Outcome) -> Outcome {
        match outcome {
            Outcome::DuplicateHash => self.duplicate_hashes += 1,
            Outcome::FilenameConflict => self.filename_conflicts += 1,
            Outcome::UnknownFingerprint => self.unknown_fingerprints += 1,
            Outcome::Committed => self.updated += 1,
        }
        outcome
    }
}

/// Single consumer of fingerprint results; sole user of the catalog session
pub struct Reconciler<'a, C: CatalogGateway + ?Sized> {
    catalog: &'a mut C,
    batch_size: usize,
    summary: ReconcileSummary,
    progress: Option<ProgressBar>,
}

impl<'a, C: CatalogGateway + ?Sized> Reconciler<'a, C> {
    /// Reconcile against `catalog`, committing every `batch_size` updates
    pub fn new(catalog: &'a mut C, batch_size: usize) -> Self {
        Self {
            catalog,
            batch_size: batch_size.max(1),
            summary: ReconcileSummary::default(),
            progress: None,
        }
    }

    /// Tick `progress` once per completed fingerprint
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn summary(&self) -> &ReconcileSummary {
        &self.summary
    }

    /// Apply one fingerprint result to the catalog.
    ///
    /// Both lookups are fresh reads on the session that performs the write.
    pub async fn reconcile_one(&mut self, result: &FingerprintResult) -> DbResult<Outcome> {
        let FingerprintResult {
            fingerprint, name, ..
        } = result;

        let assigned = self.catalog.find_assigned_filename(fingerprint).await?;
        if let Some(existing) = assigned.filter(|f| !f.is_empty()) {
            debug!(
                fingerprint = %fingerprint,
                existing = %existing,
                file = %name,
                "Fingerprint already has a filename"
            );
            return Ok(self.summary.record(Outcome::DuplicateHash));
        }

        if self.catalog.is_filename_taken(name).await? {
            info!(fingerprint = %fingerprint, "Skipping {}, already used by another hash", name);
            return Ok(self.summary.record(Outcome::FilenameConflict));
        }

        if !self.catalog.assign_filename(fingerprint, name).await? {
            debug!(fingerprint = %fingerprint, file = %name, "No unbound catalog record for fingerprint");
            return Ok(self.summary.record(Outcome::UnknownFingerprint));
        }

        self.summary.record(Outcome::Committed);

        if self.summary.updated % self.batch_size == 0 {
            self.commit().await?;
            info!("Committed {} updates so far...", self.summary.updated);
        }

        Ok(Outcome::Committed)
    }

    /// Fingerprint `files` with `workers` concurrent reads and reconcile each
    /// result as it completes.
    ///
    /// Always finishes with a commit. On a catalog error, a best-effort commit
    /// of the assignments already made is attempted before the error is
    /// returned.
    pub async fn run<I>(
        mut self,
        files: I,
        workers: usize,
        cancel: CancellationToken,
    ) -> DbResult<ReconcileSummary>
    where
        I: IntoIterator<Item = FileDescriptor>,
    {
        let mut files = files.into_iter().peekable();

        {
            let results = fingerprint_stream(files.by_ref(), workers, cancel.clone());
            pin_mut!(results);

            while let Some(result) = results.next().await {
                if let Some(progress) = &self.progress {
                    progress.inc(1);
                }

                let Some(result) = result else {
                    self.summary.read_failures += 1;
                    continue;
                };
                self.summary.fingerprinted += 1;

                if let Err(e) = self.reconcile_one(&result).await {
                    self.finish_progress();
                    error!(path = %result.path.display(), error = %e, "Catalog update failed, aborting run");
                    self.flush_after_failure().await;
                    return Err(e);
                }
            }
        }

        self.summary.cancelled = cancel.is_cancelled() && files.peek().is_some();
        if self.summary.cancelled {
            warn!(
                updated = self.summary.updated,
                "Run cancelled, committing assignments made so far"
            );
        }

        self.finish_progress();
        self.commit().await?;

        info!("Finished. Total updated rows: {}", self.summary.updated);

        Ok(self.summary)
    }

    async fn commit(&mut self) -> DbResult<()> {
        self.catalog.commit().await?;
        self.summary.commits += 1;
        Ok(())
    }

    async fn flush_after_failure(&mut self) {
        match self.commit().await {
            Ok(()) => info!(
                updated = self.summary.updated,
                "Committed assignments made before the failure"
            ),
            Err(e) => warn!(error = %e, "Assignments since the last commit were lost"),
        }
    }

    fn finish_progress(&self) {
        if let Some(progress) = &self.progress {
            progress.finish_and_clear();
        }
    }
}
