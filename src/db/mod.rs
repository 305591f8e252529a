//! Persistence layer split across logical submodules. The [`Store`] owns the
//! single SQLite connection plus the managed document directory and is the
//! only way the rest of the application touches either; no module-level
//! connection globals exist.

mod books;
mod connection;
mod sales;

use std::path::{Path, PathBuf};

use anyhow::Result;
use rusqlite::Connection;

use crate::documents::DocumentStore;

pub use connection::{default_db_path, default_documents_dir};

/// Owns the database connection and document directory for the lifetime of
/// the process. Constructed once in `main` and threaded into the UI, which
/// keeps every mutation going through one explicit object.
pub struct Store {
    conn: Connection,
    documents: DocumentStore,
}

impl Store {
    /// Open the store at its default location beneath the user's home
    /// directory, creating files and running migrations as needed.
    pub fn open_default() -> Result<Self> {
        let conn = connection::open_database(&default_db_path()?)?;
        let documents = DocumentStore::new(default_documents_dir()?)?;
        Ok(Self { conn, documents })
    }

    /// Open the store against explicit locations. Useful for tooling that
    /// points at a copied data directory.
    pub fn open_at(db_path: &Path, documents_dir: PathBuf) -> Result<Self> {
        let conn = connection::open_database(db_path)?;
        let documents = DocumentStore::new(documents_dir)?;
        Ok(Self { conn, documents })
    }

    /// Fully in-memory database with a caller-provided document directory.
    /// The test suites build every fixture through this constructor.
    pub fn open_in_memory(documents_dir: PathBuf) -> Result<Self> {
        let conn = connection::open_in_memory()?;
        let documents = DocumentStore::new(documents_dir)?;
        Ok(Self { conn, documents })
    }

    /// Access the managed document directory.
    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Store;
    use crate::models::{Book, BookFields};

    /// In-memory store backed by a throwaway document directory.
    pub(crate) fn store() -> (tempfile::TempDir, Store) {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Store::open_in_memory(tmp.path().join("documents")).expect("store");
        (tmp, store)
    }

    /// Insert a book with the given stock and price, returning the row.
    pub(crate) fn seed_book(store: &Store, title: &str, price: f64, quantity: i64) -> Book {
        store
            .create_book(BookFields {
                title: title.to_string(),
                author: "Test Author".to_string(),
                price,
                quantity,
                description: String::new(),
                document_path: None,
            })
            .expect("seed book")
    }
}
