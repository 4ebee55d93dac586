//! Recursive discovery of regular files under the configured roots

use hashbind_common::FileDescriptor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Lazily walks a list of root directories.
///
/// Missing roots and roots that are not directories are skipped. Roots are
/// made absolute, so every yielded path is too. Unreadable directories and
/// symlink loops are logged and skipped without ending the walk.
#[derive(Debug, Clone)]
pub struct FileEnumerator {
    roots: Vec<PathBuf>,
    follow_links: bool,
}

impl FileEnumerator {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            follow_links: false,
        }
    }

    /// Descend into symlinked directories (off by default)
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Every regular file under the roots, in root order
    pub fn files(&self) -> impl Iterator<Item = FileDescriptor> + '_ {
        self.roots
            .iter()
            .filter_map(|root| resolve_root(root))
            .flat_map(move |root| self.walk(root))
    }

    /// Drain [`files`](Self::files) so the total is known up front
    pub fn collect_all(&self) -> Vec<FileDescriptor> {
        self.files().collect()
    }

    fn walk(&self, root: PathBuf) -> impl Iterator<Item = FileDescriptor> + '_ {
        WalkDir::new(root)
            .follow_links(self.follow_links)
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    let path = err.path().map(|p| p.display().to_string()).unwrap_or_default();
                    if err.loop_ancestor().is_some() {
                        warn!(path = %path, "Symlink loop detected, skipping");
                    } else {
                        warn!(path = %path, error = %err, "Cannot read directory entry, skipping");
                    }
                    None
                },
            })
            .filter(is_regular_file)
            .map(|entry| FileDescriptor::from_path(entry.into_path()))
    }
}

fn resolve_root(root: &Path) -> Option<PathBuf> {
    if !root.exists() {
        debug!(root = %root.display(), "Skipping missing path");
        return None;
    }
    if !root.is_dir() {
        debug!(root = %root.display(), "Skipping root that is not a directory");
        return None;
    }

    match std::path::absolute(root) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!(root = %root.display(), error = %e, "Cannot resolve root, skipping");
            None
        },
    }
}

/// Regular files, including symlinks that resolve to one
fn is_regular_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}
