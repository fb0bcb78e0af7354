use std::collections::HashMap;

use super::BookStore;
use crate::book::Book;
use crate::error::Result;

/// Book store kept entirely in memory; used for dry runs and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    books: HashMap<String, (i64, Book)>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Book> {
        self.books.get(path).map(|(_, book)| book)
    }

    /// Stored books ordered by insertion
    pub fn books(&self) -> Vec<&Book> {
        let mut entries: Vec<_> = self.books.values().collect();
        entries.sort_by_key(|(id, _)| *id);
        entries.into_iter().map(|(_, book)| book).collect()
    }
}

impl BookStore for MemoryStore {
    fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.books.contains_key(path))
    }

    fn save(&mut self, book: &Book) -> Result<i64> {
        self.next_id += 1;
        self.books
            .insert(book.path.clone(), (self.next_id, book.clone()));
        Ok(self.next_id)
    }
}
