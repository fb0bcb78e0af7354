use serde::Deserialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{BookwormError, Result};

/// What to do when part of the tree cannot be traversed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalkErrorPolicy {
    /// Stop the walk and report the error
    #[default]
    Abort,
    /// Log a warning and continue with the rest of the tree
    Skip,
}

/// Traversal options for [`walk_files`]
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    /// Follow symbolic links. Link cycles are reported as walk errors.
    pub follow_links: bool,
    pub on_error: WalkErrorPolicy,
}

/// Lazily walk every regular file under `root`, yielding absolute paths.
///
/// The root is canonicalized first, so every yielded path is absolute. Order is
/// whatever the filesystem returns. Each call starts a fresh traversal.
pub fn walk_files(root: &Path, options: WalkOptions) -> Result<FileWalk> {
    let root = root.canonicalize()?;
    log::debug!("Walking {}", root.display());

    Ok(FileWalk {
        inner: WalkDir::new(root).follow_links(options.follow_links).into_iter(),
        on_error: options.on_error,
        finished: false,
    })
}

/// Iterator returned by [`walk_files`]
pub struct FileWalk {
    inner: walkdir::IntoIter,
    on_error: WalkErrorPolicy,
    finished: bool,
}

impl Iterator for FileWalk {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            match self.inner.next()? {
                Ok(entry) => {
                    // Linked files are yielded even when linked directories are not entered
                    if entry.file_type().is_file()
                        || (entry.path_is_symlink() && entry.path().is_file())
                    {
                        return Some(Ok(entry.into_path()));
                    }
                }
                Err(e) => match self.on_error {
                    WalkErrorPolicy::Abort => {
                        self.finished = true;
                        return Some(Err(BookwormError::Walk(e)));
                    }
                    WalkErrorPolicy::Skip => {
                        log::warn!("Skipping unreadable part of the tree: {}", e);
                    }
                },
            }
        }
    }
}
