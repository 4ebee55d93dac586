//! `hashbind scan` command implementation
//!
//! Enumerates and fingerprints the configured directories without touching
//! the catalog. Prints one line per file, in completion order.

use crate::commands::enumerate_files;
use crate::config::{Config, Overrides};
use crate::error::Result;
use crate::worker::fingerprint_stream;
use futures::{pin_mut, StreamExt};
use hashbind_common::FingerprintResult;
use std::io::Write;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Options for a scan
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub workers: Option<usize>,
    pub json: bool,
}

/// Fingerprint every configured file and write the results to stdout
pub async fn run(config_path: &Path, options: ScanOptions, cancel: CancellationToken) -> Result<usize> {
    let overrides = Overrides {
        workers: options.workers,
        batch_size: None,
    };
    let config = Config::load(config_path, &overrides)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    scan_into(&config, options.json, cancel, &mut out).await
}

/// Fingerprint every file under `config.directories` into `out`.
///
/// Returns the number of files fingerprinted.
pub async fn scan_into<W: Write>(
    config: &Config,
    json: bool,
    cancel: CancellationToken,
    out: &mut W,
) -> Result<usize> {
    let files = enumerate_files(config.directories.clone(), config.follow_links, false).await?;
    let total = files.len();

    let results = fingerprint_stream(files, config.workers, cancel);
    pin_mut!(results);

    let mut fingerprinted = 0;
    while let Some(result) = results.next().await {
        let Some(result) = result else { continue };
        write_result(out, &result, json)?;
        fingerprinted += 1;
    }
    out.flush()?;

    info!(total, fingerprinted, "Scan finished");
    Ok(fingerprinted)
}

fn write_result<W: Write>(out: &mut W, result: &FingerprintResult, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer(&mut *out, result)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}  {}", result.fingerprint, result.path.display())?;
    }
    Ok(())
}
