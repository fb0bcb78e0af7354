use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;

use crate::book::Book;
use crate::error::{BookwormError, Result};

pub mod memory;
pub mod migrate;

pub use memory::MemoryStore;

/// Persistence collaborator used by the importer.
///
/// `exists` and `save` are two separate calls; nothing makes the pair atomic, so
/// two importers working on overlapping trees can race on the same path.
pub trait BookStore {
    /// Whether a book with this absolute path was already recorded
    fn exists(&self, path: &str) -> Result<bool>;

    /// Record a book, returning the stored record id
    fn save(&mut self, book: &Book) -> Result<i64>;
}

/// SQLite-backed book store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file and bring its schema up to date
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path).map_err(BookwormError::Database)?;

        // WAL mode for better concurrency, NORMAL sync for speed, foreign keys for integrity
        conn.execute_batch(
            "PRAGMA journal_mode = WAL; \
             PRAGMA synchronous = NORMAL; \
             PRAGMA foreign_keys = ON;",
        )?;

        Self::with_connection(conn)
    }

    /// In-memory database, mostly useful for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::with_connection(conn)
    }

    fn with_connection(mut conn: Connection) -> Result<Self> {
        migrate::run_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn count_books(&self) -> Result<i64> {
        self.count("books")
    }

    pub fn count_authors(&self) -> Result<i64> {
        self.count("authors")
    }

    pub fn count_genres(&self) -> Result<i64> {
        self.count("genres")
    }

    fn count(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }

    /// Load a stored book back by its path
    pub fn get_book_by_path(&self, path: &str) -> Result<Option<Book>> {
        let book = self
            .conn
            .query_row(
                r#"
                SELECT b.path, a.first_name, a.middle_name, a.last_name,
                       b.title, g.name, b.date, b.language
                FROM books b
                LEFT JOIN authors a ON a.id = b.author_id
                LEFT JOIN genres g ON g.id = b.genre_id
                WHERE b.path = ?1
                "#,
                params![path],
                |row| {
                    Ok(Book {
                        path: row.get(0)?,
                        author_first_name: row.get(1)?,
                        author_middle_name: row.get(2)?,
                        author_last_name: row.get(3)?,
                        title: row.get(4)?,
                        genre: row.get(5)?,
                        date: row.get(6)?,
                        language: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(book)
    }
}

impl BookStore for SqliteStore {
    fn exists(&self, path: &str) -> Result<bool> {
        let found: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM books WHERE path = ?1)",
            params![path],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    fn save(&mut self, book: &Book) -> Result<i64> {
        let tx = self.conn.transaction()?;

        let author_id = author_id(&tx, book)?;
        let genre_id = match book.genre.as_deref() {
            Some(genre) => Some(genre_id(&tx, genre)?),
            None => None,
        };

        tx.execute(
            r#"
            INSERT INTO books (path, title, date, language, author_id, genre_id, imported_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                book.path,
                book.title,
                book.date,
                book.language,
                author_id,
                genre_id,
                Utc::now().to_rfc3339(),
            ],
        )?;
        let book_id = tx.last_insert_rowid();
        tx.commit()?;

        log::trace!("Stored book {} as id {}", book.path, book_id);
        Ok(book_id)
    }
}

/// Existing author row matching all three name parts (NULL-aware), or a new one
fn author_id(tx: &Transaction<'_>, book: &Book) -> Result<i64> {
    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM authors \
             WHERE first_name IS ?1 AND middle_name IS ?2 AND last_name IS ?3",
            params![
                book.author_first_name,
                book.author_middle_name,
                book.author_last_name
            ],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    tx.execute(
        "INSERT INTO authors (first_name, middle_name, last_name) VALUES (?1, ?2, ?3)",
        params![
            book.author_first_name,
            book.author_middle_name,
            book.author_last_name
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn genre_id(tx: &Transaction<'_>, name: &str) -> Result<i64> {
    tx.execute(
        "INSERT OR IGNORE INTO genres (name) VALUES (?1)",
        params![name],
    )?;
    Ok(tx.query_row(
        "SELECT id FROM genres WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_book(path: &str) -> Book {
        Book {
            path: path.to_string(),
            author_first_name: Some("Franz".to_string()),
            author_middle_name: Some("?".to_string()),
            author_last_name: Some("Kafka".to_string()),
            title: Some("The Castle".to_string()),
            genre: Some("prose_classic".to_string()),
            date: Some("1926".to_string()),
            language: Some("de".to_string()),
        }
    }

    #[test]
    fn test_missing_book_does_not_exist() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(!store.exists("/not/existing/path/").unwrap());
        assert!(store.get_book_by_path("/not/existing/path/").unwrap().is_none());
    }

    #[test]
    fn test_saved_book_exists_and_round_trips() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let book = fake_book("/tmp/book");
        let id = store.save(&book).unwrap();
        assert!(id > 0);

        assert!(store.exists("/tmp/book").unwrap());
        assert_eq!(store.get_book_by_path("/tmp/book").unwrap(), Some(book));
    }

    #[test]
    fn test_authors_and_genres_are_deduplicated() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.save(&fake_book("/tmp/castle")).unwrap();
        store.save(&fake_book("/tmp/trial")).unwrap();

        let mut anonymous = fake_book("/tmp/anon");
        anonymous.author_first_name = None;
        anonymous.author_middle_name = None;
        anonymous.author_last_name = None;
        anonymous.genre = None;
        store.save(&anonymous).unwrap();
        let mut anonymous_again = anonymous.clone();
        anonymous_again.path = "/tmp/anon2".to_string();
        store.save(&anonymous_again).unwrap();

        assert_eq!(store.count_books().unwrap(), 4);
        assert_eq!(store.count_authors().unwrap(), 2);
        assert_eq!(store.count_genres().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_path_is_rejected() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.save(&fake_book("/tmp/book")).unwrap();
        assert!(matches!(
            store.save(&fake_book("/tmp/book")),
            Err(BookwormError::Database(_))
        ));
        assert_eq!(store.count_books().unwrap(), 1);
    }

    #[test]
    fn test_open_file_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested/bookworm/db.sqlite");
        {
            let mut store = SqliteStore::open(&db_path).unwrap();
            store.save(&fake_book("/tmp/book")).unwrap();
        }
        assert!(db_path.exists());

        let store = SqliteStore::open(&db_path).unwrap();
        assert!(store.exists("/tmp/book").unwrap());
    }
}
