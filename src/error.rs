use thiserror::Error;

/// Why a single file could not be turned into a [`crate::Book`].
///
/// Every variant maps to a silent per-file skip in the importer; the variant only
/// tells a caller what went wrong if it wants to log it.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The path's extension is not in the recognized set
    #[error("unsupported extension: {0:?}")]
    UnsupportedExtension(String),

    /// Archive entry count or entry name check failed
    #[error("invalid container: {0}")]
    InvalidContainer(String),

    /// The document prefix has no `title-info` or nested `author` element
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Reading the file, the archive listing or the entry stream failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for FormatError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => FormatError::Io(e),
            other => FormatError::InvalidContainer(other.to_string()),
        }
    }
}

/// Main error type for Bookworm
#[derive(Error, Debug)]
pub enum BookwormError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Directory traversal failed; aborts the whole walk
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// File watcher errors
    #[error("Watch error: {0}")]
    Watch(String),

    /// Processor-level umbrella error: the file cannot be imported
    #[error("Unsupported file type: {path}")]
    UnsupportedFileType {
        path: String,
        #[source]
        reason: FormatError,
    },
}

impl BookwormError {
    /// The distinguished reason behind an `UnsupportedFileType`, if this is one
    pub fn format_reason(&self) -> Option<&FormatError> {
        match self {
            BookwormError::UnsupportedFileType { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Convenient Result type using BookwormError
pub type Result<T> = std::result::Result<T, BookwormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BookwormError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_error_from_rusqlite() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let err: BookwormError = rusqlite_err.into();
        assert!(matches!(err, BookwormError::Database(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BookwormError = io_err.into();
        assert!(matches!(err, BookwormError::Io(_)));
    }

    #[test]
    fn test_zip_error_maps_to_invalid_container() {
        let err: FormatError = zip::result::ZipError::InvalidArchive("bad".into()).into();
        assert!(matches!(err, FormatError::InvalidContainer(_)));

        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: FormatError = zip::result::ZipError::Io(io).into();
        assert!(matches!(err, FormatError::Io(_)));
    }

    #[test]
    fn test_unsupported_file_type_keeps_reason() {
        let err = BookwormError::UnsupportedFileType {
            path: "/tmp/book.fb2".to_string(),
            reason: FormatError::InvalidFormat("no title-info".to_string()),
        };
        assert!(err.to_string().contains("/tmp/book.fb2"));
        assert!(matches!(err.format_reason(), Some(FormatError::InvalidFormat(_))));
    }
}
