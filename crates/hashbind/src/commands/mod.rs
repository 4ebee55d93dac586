//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod run;
pub mod scan;

use crate::enumerate::FileEnumerator;
use crate::error::Result;
use crate::progress::create_spinner;
use hashbind_common::FileDescriptor;
use std::path::PathBuf;
use tracing::info;

/// Walk `directories` on the blocking pool and collect every regular file
pub async fn enumerate_files(
    directories: Vec<PathBuf>,
    follow_links: bool,
    show_progress: bool,
) -> Result<Vec<FileDescriptor>> {
    let spinner = show_progress.then(|| create_spinner("Scanning directories..."));

    let walk = tokio::task::spawn_blocking(move || {
        FileEnumerator::new(directories)
            .follow_links(follow_links)
            .collect_all()
    })
    .await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let files = walk.map_err(|e| anyhow::anyhow!("directory walk did not complete: {}", e))?;
    info!(files = files.len(), "Enumerated files");

    Ok(files)
}
