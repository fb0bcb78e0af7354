pub mod fb2;
pub mod importer;
pub mod processors;
pub mod walker;

pub use fb2::{MetadataCollector, BYTES_LIMIT};
pub use importer::{DirectoryImporter, ImportOutcome, ImportSummary};
pub use processors::{
    processor_for, ArchiveProcessor, BookFileProcessor, ContainerKind, PlainProcessor,
};
pub use walker::{walk_files, FileWalk, WalkErrorPolicy, WalkOptions};
