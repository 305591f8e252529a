use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::Connection;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".bookstore-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "books.sqlite";
/// Directory holding copied documents, next to the database file.
const DOCUMENTS_DIR_NAME: &str = "documents";

/// Ordered schema migrations. Each entry is one batch applied inside its own
/// transaction; `PRAGMA user_version` records how far a database has been
/// migrated, so adding a batch here is the only step a schema change needs.
const MIGRATIONS: &[&str] = &[
    // v1: initial schema. Stock can never go negative and sales follow their
    // book when it is deleted.
    "CREATE TABLE books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        price REAL NOT NULL DEFAULT 0 CHECK (price >= 0),
        quantity INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
        description TEXT NOT NULL DEFAULT '',
        document_path TEXT,
        added_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE sales (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
        sold_at TEXT NOT NULL,
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        unit_price REAL NOT NULL,
        total REAL NOT NULL
    );
    CREATE INDEX sales_book_id ON sales(book_id);",
];

/// Open the database file at `path`, bring the schema up to date, and return
/// a live connection. `PRAGMA foreign_keys = ON` is set on every open so the
/// cascade from books to sales behaves the same during tests and production
/// runs.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let mut conn = Connection::open(path).context("failed to open SQLite database")?;
    prepare_connection(&mut conn)?;
    Ok(conn)
}

/// In-memory variant used by tests and tooling; runs the same migrations.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    prepare_connection(&mut conn)?;
    Ok(conn)
}

fn prepare_connection(conn: &mut Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", true)
        .context("failed to enable foreign keys")?;
    migrate(conn)
}

/// Apply every migration the database has not seen yet. Each batch commits
/// together with its version bump, so a failure leaves the database at the
/// last fully applied version.
fn migrate(conn: &mut Connection) -> Result<()> {
    let current: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("failed to read schema version")?;

    let latest = MIGRATIONS.len() as i64;
    if current > latest {
        return Err(anyhow!(
            "database schema version {current} is newer than this build supports ({latest})"
        ));
    }

    for (index, batch) in MIGRATIONS.iter().enumerate().skip(current as usize) {
        let version = (index + 1) as i64;
        let tx = conn
            .transaction()
            .context("failed to start migration transaction")?;
        tx.execute_batch(batch)
            .with_context(|| format!("failed to apply schema migration {version}"))?;
        tx.pragma_update(None, "user_version", version)
            .with_context(|| format!("failed to record schema version {version}"))?;
        tx.commit()
            .with_context(|| format!("failed to commit schema migration {version}"))?;
        log::info!("applied schema migration {version}");
    }

    Ok(())
}

/// Resolve the absolute path to the SQLite database inside the user's home.
pub fn default_db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(DB_FILE_NAME))
}

/// Resolve the managed document directory inside the user's home.
pub fn default_documents_dir() -> Result<PathBuf> {
    Ok(data_dir()?.join(DOCUMENTS_DIR_NAME))
}

fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_reach_latest_version() {
        let conn = open_in_memory().unwrap();
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, MIGRATIONS.len() as i64);
    }

    #[test]
    fn migrations_are_idempotent_across_reopens() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("books.sqlite");

        let conn = open_database(&path).unwrap();
        drop(conn);
        // Second open must find the schema already current and change nothing.
        let conn = open_database(&path).unwrap();
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, MIGRATIONS.len() as i64);
    }

    #[test]
    fn negative_stock_is_rejected_by_schema() {
        let conn = open_in_memory().unwrap();
        let result = conn.execute(
            "INSERT INTO books (title, author, quantity) VALUES ('t', 'a', -1)",
            [],
        );
        assert!(result.is_err());
    }
}
