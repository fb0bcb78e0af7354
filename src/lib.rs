pub mod book;
pub mod config;
pub mod error;
pub mod db;
pub mod ingest;
pub mod watch;

pub use book::Book;
pub use config::Config;
pub use db::{BookStore, MemoryStore, SqliteStore};
pub use error::{BookwormError, FormatError, Result};
pub use ingest::{DirectoryImporter, ImportOutcome, ImportSummary};
