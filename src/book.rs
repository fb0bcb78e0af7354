use serde::Serialize;
use std::fmt;

/// Bibliographic record extracted from one book file.
///
/// `path` is the absolute canonical path of the file and the identity key used
/// for deduplication. All other fields are raw text from the document header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    pub path: String,
    pub author_first_name: Option<String>,
    pub author_middle_name: Option<String>,
    pub author_last_name: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub date: Option<String>,
    pub language: Option<String>,
}

impl Book {
    /// Author name parts that are present, joined with single spaces
    pub fn author_full_name(&self) -> String {
        [
            &self.author_first_name,
            &self.author_middle_name,
            &self.author_last_name,
        ]
        .iter()
        .filter_map(|part| part.as_deref())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.author_full_name(),
            self.title.as_deref().unwrap_or("")
        )
    }
}
