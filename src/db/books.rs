use anyhow::{Context, Result};
use rusqlite::{params, Row};

use crate::error::LedgerError;
use crate::models::{Book, BookFields};

use super::Store;

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        price: row.get(3)?,
        quantity: row.get(4)?,
        description: row.get(5)?,
        document_path: row.get(6)?,
        added_at: row.get(7)?,
    })
}

const BOOK_COLUMNS: &str =
    "id, title, author, price, quantity, description, document_path, added_at";

impl Store {
    /// Fetch the whole catalog, ordered case-insensitively so mixed-case
    /// titles group together in the UI.
    pub fn fetch_books(&self) -> Result<Vec<Book>> {
        let mut stmt = self
            .conn()
            .prepare(&format!(
                "SELECT {BOOK_COLUMNS} FROM books
                 ORDER BY title COLLATE NOCASE, author COLLATE NOCASE"
            ))
            .context("failed to prepare catalog query")?;

        let books = stmt
            .query_map([], book_from_row)
            .context("failed to iterate books")?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to collect books")?;

        Ok(books)
    }

    /// Look up a single book. Sell and document flows re-read the row right
    /// before acting so they never trust stale UI state.
    pub fn fetch_book(&self, id: i64) -> Result<Book> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"))
            .context("failed to prepare book lookup")?;

        stmt.query_row([id], book_from_row)
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => LedgerError::BookNotFound(id).into(),
                other => anyhow::Error::from(other).context("failed to load book"),
            })
    }

    /// Insert a brand new book. We echo the hydrated struct so callers can
    /// update UI state without having to re-query the database.
    pub fn create_book(&self, fields: BookFields) -> Result<Book> {
        self.conn()
            .execute(
                "INSERT INTO books (title, author, price, quantity, description, document_path)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    fields.title,
                    fields.author,
                    fields.price,
                    fields.quantity,
                    fields.description,
                    fields.document_path,
                ],
            )
            .context("failed to insert book")?;

        let id = self.conn().last_insert_rowid();
        self.fetch_book(id)
    }

    /// Update all editable book fields. We surface an explicit error when
    /// zero rows are touched so the UI can show a friendly message instead of
    /// silently continuing.
    pub fn update_book(&self, id: i64, fields: BookFields) -> Result<()> {
        let updated = self
            .conn()
            .execute(
                "UPDATE books
                 SET title = ?1, author = ?2, price = ?3, quantity = ?4,
                     description = ?5, document_path = ?6
                 WHERE id = ?7",
                params![
                    fields.title,
                    fields.author,
                    fields.price,
                    fields.quantity,
                    fields.description,
                    fields.document_path,
                    id,
                ],
            )
            .context("failed to update book")?;

        if updated == 0 {
            Err(LedgerError::BookNotFound(id).into())
        } else {
            Ok(())
        }
    }

    /// Permanently delete a book. The schema cascades to its sales rows, and
    /// the backing document file is removed from the managed directory when
    /// one exists. A file that refuses to delete is logged rather than
    /// blocking the catalog removal.
    pub fn delete_book(&self, id: i64) -> Result<()> {
        let book = self.fetch_book(id)?;

        let deleted = self
            .conn()
            .execute("DELETE FROM books WHERE id = ?1", params![id])
            .context("failed to delete book")?;
        if deleted == 0 {
            return Err(LedgerError::BookNotFound(id).into());
        }

        if let Some(path) = book.document_path.as_deref() {
            if let Err(err) = self.documents().remove(std::path::Path::new(path)) {
                log::warn!("book {id} deleted but its document was not: {err:#}");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{seed_book, store};
    use crate::error::LedgerError;
    use crate::models::BookFields;

    #[test]
    fn created_book_round_trips_through_catalog() {
        let (_tmp, store) = store();
        let book = seed_book(&store, "The Trial", 12.50, 3);

        let catalog = store.fetch_books().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].id, book.id);
        assert_eq!(catalog[0].title, "The Trial");
        assert_eq!(catalog[0].quantity, 3);
        assert!(!catalog[0].added_at.is_empty());
    }

    #[test]
    fn catalog_orders_titles_case_insensitively() {
        let (_tmp, store) = store();
        seed_book(&store, "zebra", 1.0, 1);
        seed_book(&store, "Alpha", 1.0, 1);
        seed_book(&store, "beta", 1.0, 1);

        let titles: Vec<String> = store
            .fetch_books()
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, ["Alpha", "beta", "zebra"]);
    }

    #[test]
    fn update_rewrites_fields() {
        let (_tmp, store) = store();
        let book = seed_book(&store, "Draft", 5.0, 2);

        store
            .update_book(
                book.id,
                BookFields {
                    title: "Final".to_string(),
                    author: "Someone".to_string(),
                    price: 7.5,
                    quantity: 4,
                    description: "second edition".to_string(),
                    document_path: None,
                },
            )
            .unwrap();

        let reloaded = store.fetch_book(book.id).unwrap();
        assert_eq!(reloaded.title, "Final");
        assert_eq!(reloaded.price, 7.5);
        assert_eq!(reloaded.quantity, 4);
    }

    #[test]
    fn update_missing_book_reports_not_found() {
        let (_tmp, store) = store();
        let err = store
            .update_book(999, BookFields::default())
            .expect_err("missing book must fail");
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::BookNotFound(999))
        ));
    }

    #[test]
    fn deleted_book_disappears_from_catalog() {
        let (_tmp, store) = store();
        let keep = seed_book(&store, "Keep", 1.0, 1);
        let drop = seed_book(&store, "Drop", 1.0, 1);

        store.delete_book(drop.id).unwrap();

        let catalog = store.fetch_books().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].id, keep.id);
    }

    #[test]
    fn delete_removes_backing_document() {
        let (tmp, store) = store();
        let source = tmp.path().join("attached.pdf");
        std::fs::write(&source, b"doc").unwrap();
        let stored = store.documents().import(&source).unwrap();

        let book = store
            .create_book(BookFields {
                title: "With Doc".to_string(),
                author: "A".to_string(),
                price: 3.0,
                quantity: 1,
                description: String::new(),
                document_path: Some(stored.to_string_lossy().into_owned()),
            })
            .unwrap();

        store.delete_book(book.id).unwrap();
        assert!(!stored.exists());
    }
}
