//! `hashbind run` command implementation
//!
//! Connects to the catalog, makes sure the `filename` column exists, walks the
//! configured directories and binds filenames to matching records.

use crate::catalog::{CatalogGateway, PgCatalog};
use crate::commands::enumerate_files;
use crate::config::{Config, Overrides};
use crate::error::Result;
use crate::progress::create_progress_bar;
use crate::reconcile::{ReconcileSummary, Reconciler};
use colored::Colorize;
use hashbind_common::FileDescriptor;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Options for a reconciliation run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub overrides: Overrides,
    pub show_progress: bool,
}

/// Run a full reconciliation against the PostgreSQL catalog
pub async fn run(
    config_path: &Path,
    options: RunOptions,
    cancel: CancellationToken,
) -> Result<ReconcileSummary> {
    let config = Config::load(config_path, &options.overrides)?;
    info!(
        table = %config.table,
        directories = config.directories.len(),
        workers = config.workers,
        batch_size = config.batch_size,
        "Starting reconciliation"
    );

    let mut catalog = PgCatalog::connect(&config.database, config.table.clone()).await?;
    let result = reconcile_with(&mut catalog, &config, options.show_progress, cancel).await;

    if let Err(e) = catalog.close().await {
        warn!(error = %e, "Failed to close catalog connection");
    }

    let summary = result?;
    print_summary(&summary);

    Ok(summary)
}

/// Everything `run` does between connecting and closing, against any catalog.
///
/// The caller owns the catalog session and closes it.
pub async fn reconcile_with<C>(
    catalog: &mut C,
    config: &Config,
    show_progress: bool,
    cancel: CancellationToken,
) -> Result<ReconcileSummary>
where
    C: CatalogGateway + ?Sized,
{
    catalog.ensure_filename_column().await?;

    let files: Vec<FileDescriptor> =
        enumerate_files(config.directories.clone(), config.follow_links, show_progress).await?;
    println!("Total files found: {}", files.len());

    let mut reconciler = Reconciler::new(catalog, config.batch_size);
    if show_progress {
        reconciler = reconciler.with_progress(create_progress_bar(files.len() as u64, "Fingerprinting files"));
    }

    Ok(reconciler.run(files, config.workers, cancel).await?)
}

fn print_summary(summary: &ReconcileSummary) {
    println!();
    println!("{}", "Summary:".cyan().bold());
    println!("  Fingerprinted:      {}", summary.fingerprinted);
    if summary.read_failures > 0 {
        println!("  Unreadable:         {}", summary.read_failures.to_string().yellow());
    }
    println!("  Already named:      {}", summary.duplicate_hashes);
    println!("  Filename conflicts: {}", summary.filename_conflicts);
    println!("  Not in catalog:     {}", summary.unknown_fingerprints);
    println!("  Commits:            {}", summary.commits);
    println!(
        "{} Total updated rows: {}",
        "✓".green(),
        summary.updated.to_string().green().bold()
    );

    if summary.cancelled {
        println!("{}", "Run was interrupted; remaining files were not processed.".yellow());
    }
}
