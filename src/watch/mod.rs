//! Watch library roots and import books as they appear.
//!
//! A notify thread debounces filesystem events and hands paths to the calling
//! thread, which runs each one through the regular single-file import.

mod watcher;

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use crate::db::BookStore;
use crate::error::Result;
use crate::ingest::{DirectoryImporter, ImportOutcome};

pub use watcher::run_watcher_thread;

/// Import one changed path if it is a regular file. Directories and vanished
/// paths are ignored.
pub fn handle_path<S: BookStore>(
    importer: &mut DirectoryImporter<S>,
    path: &Path,
) -> Result<Option<ImportOutcome>> {
    if !path.is_file() {
        return Ok(None);
    }
    let outcome = importer.import_file(path)?;
    if let ImportOutcome::Imported(id) = outcome {
        log::info!("watch: imported {} (id {})", path.display(), id);
    }
    Ok(Some(outcome))
}

/// Run the watcher until its thread exits. Blocks the calling thread.
pub fn run_watcher<S: BookStore>(
    importer: &mut DirectoryImporter<S>,
    roots: Vec<PathBuf>,
    debounce_ms: u64,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();

    let handle = std::thread::spawn(move || {
        if let Err(e) = run_watcher_thread(&roots, debounce_ms, tx) {
            log::error!("watcher thread error: {}", e);
        }
    });

    for path in rx {
        if let Err(e) = handle_path(importer, &path) {
            log::error!("watch: {}: {}", path.display(), e);
        }
    }

    let _ = handle.join();
    Ok(())
}
