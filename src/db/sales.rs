use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::params;

use crate::error::LedgerError;
use crate::models::{BookSummary, LedgerStats, Sale};

use super::Store;

/// Timestamp format stored in the `sold_at` column. Kept sortable so
/// `ORDER BY sold_at` stays chronological without date parsing.
const SOLD_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl Store {
    /// Record a sale of `quantity` copies of `book_id`.
    ///
    /// The stock check, the ledger insert, and the stock decrement all run
    /// inside one transaction: either a sale row exists and the stock
    /// dropped by exactly `quantity`, or nothing changed at all. The unit
    /// price is captured from the catalog at this moment, so later price
    /// edits leave recorded revenue alone.
    pub fn sell(&mut self, book_id: i64, quantity: i64) -> Result<Sale> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity(quantity).into());
        }

        let tx = self
            .conn_mut()
            .transaction()
            .context("failed to start sale transaction")?;

        let (title, price, available): (String, f64, i64) = tx
            .query_row(
                "SELECT title, price, quantity FROM books WHERE id = ?1",
                [book_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => {
                    anyhow::Error::from(LedgerError::BookNotFound(book_id))
                }
                other => anyhow::Error::from(other).context("failed to load book for sale"),
            })?;

        if quantity > available {
            return Err(LedgerError::InsufficientStock {
                requested: quantity,
                available,
            }
            .into());
        }

        let sold_at = Local::now().format(SOLD_AT_FORMAT).to_string();
        let total = price * quantity as f64;

        tx.execute(
            "INSERT INTO sales (book_id, sold_at, quantity, unit_price, total)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![book_id, sold_at, quantity, price, total],
        )
        .context("failed to insert sale")?;
        let sale_id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE books SET quantity = quantity - ?1 WHERE id = ?2",
            params![quantity, book_id],
        )
        .context("failed to decrement stock")?;

        tx.commit().context("failed to commit sale")?;
        log::info!("sold {quantity} x book {book_id} for {total:.2}");

        Ok(Sale {
            id: sale_id,
            book_id,
            book_title: title,
            sold_at,
            quantity,
            unit_price: price,
            total,
        })
    }

    /// Fetch the ledger newest-first, joined with book titles for display and
    /// export. Rows whose book was deleted are gone too (the schema cascades),
    /// so the join never drops anything silently.
    pub fn fetch_sales(&self) -> Result<Vec<Sale>> {
        let mut stmt = self
            .conn()
            .prepare(
                "SELECT s.id, s.book_id, b.title, s.sold_at, s.quantity, s.unit_price, s.total
                 FROM sales s
                 INNER JOIN books b ON b.id = s.book_id
                 ORDER BY s.sold_at DESC, s.id DESC",
            )
            .context("failed to prepare ledger query")?;

        let sales = stmt
            .query_map([], |row| {
                Ok(Sale {
                    id: row.get(0)?,
                    book_id: row.get(1)?,
                    book_title: row.get(2)?,
                    sold_at: row.get(3)?,
                    quantity: row.get(4)?,
                    unit_price: row.get(5)?,
                    total: row.get(6)?,
                })
            })
            .context("failed to iterate sales")?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to collect sales")?;

        Ok(sales)
    }

    /// Group the ledger by book: transaction count, units sold, revenue, and
    /// average order value, biggest earners first. An empty ledger yields an
    /// empty list, not an error.
    pub fn aggregate(&self) -> Result<Vec<BookSummary>> {
        let mut stmt = self
            .conn()
            .prepare(
                "SELECT s.book_id, b.title, COUNT(s.id), SUM(s.quantity),
                        SUM(s.total), AVG(s.total)
                 FROM sales s
                 INNER JOIN books b ON b.id = s.book_id
                 GROUP BY s.book_id
                 ORDER BY SUM(s.total) DESC, b.title COLLATE NOCASE",
            )
            .context("failed to prepare aggregate query")?;

        let summaries = stmt
            .query_map([], |row| {
                Ok(BookSummary {
                    book_id: row.get(0)?,
                    title: row.get(1)?,
                    sale_count: row.get(2)?,
                    units_sold: row.get(3)?,
                    revenue: row.get(4)?,
                    average_order: row.get(5)?,
                })
            })
            .context("failed to iterate aggregates")?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to collect aggregates")?;

        Ok(summaries)
    }

    /// Ledger-wide totals for the stats screen. SQLite reports NULL sums over
    /// zero rows, so the COALESCEs keep an empty ledger at plain zeros.
    pub fn ledger_stats(&self) -> Result<LedgerStats> {
        self.conn()
            .query_row(
                "SELECT COUNT(id), COALESCE(SUM(quantity), 0),
                        COALESCE(SUM(total), 0), AVG(total)
                 FROM sales",
                [],
                |row| {
                    Ok(LedgerStats {
                        sale_count: row.get(0)?,
                        units_sold: row.get(1)?,
                        revenue: row.get(2)?,
                        average_order: row.get(3)?,
                    })
                },
            )
            .context("failed to compute ledger stats")
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{seed_book, store};
    use crate::error::LedgerError;

    #[test]
    fn sale_decrements_stock_and_records_total() {
        let (_tmp, mut store) = store();
        let book = seed_book(&store, "Dune", 9.50, 10);

        let sale = store.sell(book.id, 3).unwrap();

        assert_eq!(sale.quantity, 3);
        assert_eq!(sale.unit_price, 9.50);
        assert_eq!(sale.total, 28.50);

        let reloaded = store.fetch_book(book.id).unwrap();
        assert_eq!(reloaded.quantity, 7);

        let ledger = store.fetch_sales().unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].book_title, "Dune");
        assert_eq!(ledger[0].total, 28.50);
    }

    #[test]
    fn overselling_fails_and_leaves_everything_unchanged() {
        let (_tmp, mut store) = store();
        let book = seed_book(&store, "Scarce", 4.0, 2);

        let err = store.sell(book.id, 5).expect_err("oversell must fail");
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::InsufficientStock {
                requested: 5,
                available: 2,
            })
        ));

        assert_eq!(store.fetch_book(book.id).unwrap().quantity, 2);
        assert!(store.fetch_sales().unwrap().is_empty());
    }

    #[test]
    fn selling_exact_stock_empties_the_shelf() {
        let (_tmp, mut store) = store();
        let book = seed_book(&store, "Last Copies", 2.0, 4);

        store.sell(book.id, 4).unwrap();
        assert_eq!(store.fetch_book(book.id).unwrap().quantity, 0);

        let err = store.sell(book.id, 1).expect_err("shelf is empty");
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::InsufficientStock { available: 0, .. })
        ));
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        let (_tmp, mut store) = store();
        let book = seed_book(&store, "Any", 1.0, 1);

        for qty in [0, -2] {
            let err = store.sell(book.id, qty).expect_err("must reject");
            assert!(matches!(
                err.downcast_ref::<LedgerError>(),
                Some(LedgerError::InvalidQuantity(_))
            ));
        }
    }

    #[test]
    fn selling_unknown_book_reports_not_found() {
        let (_tmp, mut store) = store();
        let err = store.sell(42, 1).expect_err("no such book");
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::BookNotFound(42))
        ));
    }

    #[test]
    fn price_edits_do_not_rewrite_recorded_sales() {
        let (_tmp, mut store) = store();
        let book = seed_book(&store, "Repriced", 10.0, 5);
        store.sell(book.id, 1).unwrap();

        let fields = crate::models::BookFields {
            title: book.title.clone(),
            author: book.author.clone(),
            price: 20.0,
            quantity: 4,
            description: String::new(),
            document_path: None,
        };
        store.update_book(book.id, fields).unwrap();

        let ledger = store.fetch_sales().unwrap();
        assert_eq!(ledger[0].unit_price, 10.0);
        assert_eq!(ledger[0].total, 10.0);
    }

    #[test]
    fn aggregate_over_empty_ledger_is_empty_not_error() {
        let (_tmp, store) = store();
        seed_book(&store, "Unsold", 3.0, 3);

        assert!(store.aggregate().unwrap().is_empty());

        let stats = store.ledger_stats().unwrap();
        assert_eq!(stats.sale_count, 0);
        assert_eq!(stats.units_sold, 0);
        assert_eq!(stats.revenue, 0.0);
        assert!(stats.average_order.is_none());
    }

    #[test]
    fn aggregate_groups_by_book() {
        let (_tmp, mut store) = store();
        let dune = seed_book(&store, "Dune", 10.0, 10);
        let trial = seed_book(&store, "The Trial", 5.0, 10);

        store.sell(dune.id, 2).unwrap(); // 20.0
        store.sell(dune.id, 1).unwrap(); // 10.0
        store.sell(trial.id, 4).unwrap(); // 20.0

        let summary = store.aggregate().unwrap();
        assert_eq!(summary.len(), 2);

        // Biggest earner first.
        assert_eq!(summary[0].title, "Dune");
        assert_eq!(summary[0].sale_count, 2);
        assert_eq!(summary[0].units_sold, 3);
        assert_eq!(summary[0].revenue, 30.0);
        assert_eq!(summary[0].average_order, 15.0);

        assert_eq!(summary[1].title, "The Trial");
        assert_eq!(summary[1].revenue, 20.0);

        let stats = store.ledger_stats().unwrap();
        assert_eq!(stats.sale_count, 3);
        assert_eq!(stats.units_sold, 7);
        assert_eq!(stats.revenue, 50.0);
        assert!((stats.average_order.unwrap() - 50.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn deleting_a_book_cascades_to_its_sales() {
        let (_tmp, mut store) = store();
        let keep = seed_book(&store, "Keep", 2.0, 5);
        let gone = seed_book(&store, "Gone", 3.0, 5);
        store.sell(keep.id, 1).unwrap();
        store.sell(gone.id, 2).unwrap();

        store.delete_book(gone.id).unwrap();

        let ledger = store.fetch_sales().unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].book_id, keep.id);

        let summary = store.aggregate().unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].title, "Keep");
    }
}
