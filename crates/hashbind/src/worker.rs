//! Bounded fingerprint worker pool
//!
//! Files are fingerprinted on tokio's blocking pool, at most `workers` at a
//! time, and results are yielded in completion order. Workers never touch the
//! catalog; the consumer of the stream does all store work.

use futures::stream::{self, Stream, StreamExt};
use hashbind_common::fingerprint::fingerprint_file;
use hashbind_common::{FileDescriptor, FingerprintResult};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Fingerprint `files` with up to `workers` reads in flight.
///
/// Yields `None` for a file that could not be read; the failure is logged
/// here. Once `cancel` fires no further files are started, but reads already
/// in flight still complete and are yielded.
pub fn fingerprint_stream<I>(
    files: I,
    workers: usize,
    cancel: CancellationToken,
) -> impl Stream<Item = Option<FingerprintResult>>
where
    I: IntoIterator<Item = FileDescriptor>,
{
    stream::iter(files)
        .take_until(async move { cancel.cancelled().await })
        .map(fingerprint_task)
        .buffer_unordered(workers.max(1))
}

async fn fingerprint_task(file: FileDescriptor) -> Option<FingerprintResult> {
    let path = file.path.clone();

    match tokio::task::spawn_blocking(move || fingerprint_file(&file)).await {
        Ok(Ok(result)) => Some(result),
        Ok(Err(e)) => {
            warn!(path = %path.display(), error = %e, "Failed to process file, skipping");
            None
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Fingerprint task did not complete, skipping");
            None
        },
    }
}
