use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use super::fb2::MetadataCollector;
use crate::book::Book;
use crate::error::{BookwormError, FormatError, Result};

/// Name suffix an archive entry must carry to be treated as a book document
pub const DOCUMENT_SUFFIX: &str = ".fb2";

/// Container a book document is stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// A bare `.fb2` document
    Plain,
    /// A `.zip` archive holding exactly one `.fb2` document
    Archive,
}

/// Recognized extensions (case-sensitive). Add a row here to support a new container.
const EXTENSIONS: &[(&str, ContainerKind)] = &[
    ("fb2", ContainerKind::Plain),
    ("zip", ContainerKind::Archive),
];

impl ContainerKind {
    /// Classify a path by its trailing extension without touching the file
    pub fn from_path(path: &Path) -> std::result::Result<Self, FormatError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        EXTENSIONS
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| FormatError::UnsupportedExtension(extension.to_string()))
    }
}

/// Turns one book file into a [`Book`]
pub trait BookFileProcessor {
    /// Path the processor is bound to
    fn path(&self) -> &Path;

    /// Container-specific precondition, checked before any metadata parse
    fn validate(&mut self) -> std::result::Result<(), FormatError> {
        Ok(())
    }

    /// Byte stream of the document to feed the collector
    fn open_source(&mut self) -> std::result::Result<Box<dyn Read + '_>, FormatError>;

    /// Drop any handle kept open between `validate` and `open_source`
    fn release(&mut self) {}

    /// Validate, open, collect and build the book.
    ///
    /// Every failure is reported as [`BookwormError::UnsupportedFileType`], with the
    /// underlying [`FormatError`] kept as its reason.
    fn get_book(&mut self) -> Result<Book> {
        let collected = self.collect_metadata();
        self.release();
        let path = self.path();
        match collected {
            Ok(collector) => Ok(build_book(path, &collector)),
            Err(reason) => Err(BookwormError::UnsupportedFileType {
                path: path.to_string_lossy().into_owned(),
                reason,
            }),
        }
    }

    fn collect_metadata(&mut self) -> std::result::Result<MetadataCollector, FormatError> {
        self.validate()?;
        let source = self.open_source()?;
        MetadataCollector::from_reader(source)
    }
}

fn build_book(path: &Path, collector: &MetadataCollector) -> Book {
    Book {
        path: path.to_string_lossy().into_owned(),
        author_first_name: collector.author_first_name(),
        author_middle_name: collector.author_middle_name(),
        author_last_name: collector.author_last_name(),
        title: collector.title(),
        genre: collector.genre(),
        date: collector.date(),
        language: collector.language(),
    }
}

/// Select the processor for `path` by extension. Nothing is read from disk.
pub fn processor_for(path: &Path) -> std::result::Result<Box<dyn BookFileProcessor>, FormatError> {
    let processor: Box<dyn BookFileProcessor> = match ContainerKind::from_path(path)? {
        ContainerKind::Plain => Box::new(PlainProcessor::new(path)),
        ContainerKind::Archive => Box::new(ArchiveProcessor::new(path)),
    };
    Ok(processor)
}

/// Processor for a bare `.fb2` file
#[derive(Debug)]
pub struct PlainProcessor {
    path: PathBuf,
}

impl PlainProcessor {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl BookFileProcessor for PlainProcessor {
    fn path(&self) -> &Path {
        &self.path
    }

    fn open_source(&mut self) -> std::result::Result<Box<dyn Read + '_>, FormatError> {
        Ok(Box::new(File::open(&self.path)?))
    }
}

/// Processor for a `.zip` holding a single `.fb2` entry.
///
/// The entry is streamed straight out of the archive; nothing is extracted to disk.
pub struct ArchiveProcessor {
    path: PathBuf,
    archive: Option<ZipArchive<File>>,
}

impl ArchiveProcessor {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            archive: None,
        }
    }
}

fn open_archive(path: &Path) -> std::result::Result<ZipArchive<File>, FormatError> {
    let file = File::open(path)?;
    Ok(ZipArchive::new(file)?)
}

impl BookFileProcessor for ArchiveProcessor {
    fn path(&self) -> &Path {
        &self.path
    }

    fn validate(&mut self) -> std::result::Result<(), FormatError> {
        let archive = open_archive(&self.path)?;

        if archive.len() != 1 {
            return Err(FormatError::InvalidContainer(format!(
                "expected exactly one entry, found {}",
                archive.len()
            )));
        }
        let name = archive.file_names().next().unwrap_or("");
        if !name.ends_with(DOCUMENT_SUFFIX) {
            return Err(FormatError::InvalidContainer(format!(
                "entry {:?} is not a {} document",
                name, DOCUMENT_SUFFIX
            )));
        }

        self.archive = Some(archive);
        Ok(())
    }

    fn open_source(&mut self) -> std::result::Result<Box<dyn Read + '_>, FormatError> {
        let archive = match self.archive.take() {
            Some(archive) => self.archive.insert(archive),
            None => self.archive.insert(open_archive(&self.path)?),
        };
        let entry = archive.by_index(0)?;
        Ok(Box::new(entry))
    }

    fn release(&mut self) {
        self.archive = None;
    }
}
