//! Import coordinator: walk → classify → extract → persist, one path at a time.

use std::path::{Path, PathBuf};
use std::time::Instant;

use super::processors::processor_for;
use super::walker::{walk_files, WalkOptions};
use crate::db::BookStore;
use crate::error::{BookwormError, FormatError, Result};

/// Terminal state of one file in an import run
#[derive(Debug)]
pub enum ImportOutcome {
    /// A new book was extracted and saved under this record id
    Imported(i64),
    /// The path was already recorded; the file was not read
    AlreadyImported,
    /// The file could not be turned into a book
    Unsupported(FormatError),
}

/// Counters for an import run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub already_imported: usize,
    pub unsupported: usize,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.imported + self.already_imported + self.unsupported
    }

    fn record(&mut self, outcome: &ImportOutcome) {
        match outcome {
            ImportOutcome::Imported(_) => self.imported += 1,
            ImportOutcome::AlreadyImported => self.already_imported += 1,
            ImportOutcome::Unsupported(_) => self.unsupported += 1,
        }
    }
}

impl std::ops::AddAssign for ImportSummary {
    fn add_assign(&mut self, other: Self) {
        self.imported += other.imported;
        self.already_imported += other.already_imported;
        self.unsupported += other.unsupported;
    }
}

/// Imports book files into a [`BookStore`].
///
/// A single unreadable or foreign file never stops a run. Walk errors and store
/// errors do.
pub struct DirectoryImporter<S> {
    store: S,
    walk_options: WalkOptions,
}

impl<S: BookStore> DirectoryImporter<S> {
    pub fn new(store: S) -> Self {
        Self::with_walk_options(store, WalkOptions::default())
    }

    pub fn with_walk_options(store: S, walk_options: WalkOptions) -> Self {
        Self {
            store,
            walk_options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Import every file under `root`
    pub fn import_directory(&mut self, root: &Path) -> Result<ImportSummary> {
        let start = Instant::now();
        let mut summary = ImportSummary::default();

        for path in walk_files(root, self.walk_options)? {
            let path = path?;
            let outcome = self.import_file(&path)?;
            summary.record(&outcome);
        }

        log::info!(
            "Imported {} from {} ({} already imported, {} unsupported) in {:?}",
            summary.imported,
            root.display(),
            summary.already_imported,
            summary.unsupported,
            start.elapsed()
        );
        Ok(summary)
    }

    /// Import a single file unless its path is already recorded
    pub fn import_file(&mut self, path: &Path) -> Result<ImportOutcome> {
        let path = match canonical_path(path) {
            Ok(path) => path,
            Err(e) => return Ok(skip(path, FormatError::Io(e))),
        };
        let key = path.to_string_lossy();

        if self.store.exists(&key)? {
            log::debug!("Skipping {}: already imported", key);
            return Ok(ImportOutcome::AlreadyImported);
        }

        let mut processor = match processor_for(&path) {
            Ok(processor) => processor,
            Err(reason) => return Ok(skip(&path, reason)),
        };

        let book = match processor.get_book() {
            Ok(book) => book,
            Err(BookwormError::UnsupportedFileType { reason, .. }) => {
                return Ok(skip(&path, reason));
            }
            Err(e) => return Err(e),
        };
        drop(processor);

        let id = self.store.save(&book)?;
        log::debug!("Imported {} ({})", key, book);
        Ok(ImportOutcome::Imported(id))
    }
}

fn skip(path: &Path, reason: FormatError) -> ImportOutcome {
    log::debug!("Skipping {}: {}", path.display(), reason);
    ImportOutcome::Unsupported(reason)
}

/// Absolute path with symlinks and `..` resolved
fn canonical_path(path: &Path) -> std::io::Result<PathBuf> {
    std::fs::canonicalize(path)
}
