//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. The intent is that these types stay light-weight data holders so other
//! layers can focus on presentation and persistence logic.

use std::fmt;

#[derive(Debug, Clone)]
/// A catalog entry for one title the shop stocks. The struct mirrors rows in
/// the `books` table.
pub struct Book {
    /// Primary key from the database. Edit, sell, and delete flows bubble the
    /// id back to the persistence layer.
    pub id: i64,
    /// Title shown in lists and reports.
    pub title: String,
    /// Author field used both for display and filtering.
    pub author: String,
    /// Unit price in the shop currency. Never negative.
    pub price: f64,
    /// Copies currently in stock. Never negative; the ledger guards every
    /// decrement.
    pub quantity: i64,
    /// Free-form description.
    pub description: String,
    /// Path to the copied document inside the managed directory, when the
    /// book has one attached.
    pub document_path: Option<String>,
    /// Timestamp the record was created, as stored by SQLite.
    pub added_at: String,
}

impl Book {
    /// Compose a `Title - Author` string that gracefully omits the hyphen if
    /// the author is blank. List views and the sell prompt rely on this
    /// ready-to-use formatting.
    pub fn display_title(&self) -> String {
        if self.author.trim().is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.author)
        }
    }

    /// Whether at least one copy can still be sold.
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Validated field values for inserting or updating a book. Keeping the
/// struct separate from [`Book`] means callers cannot accidentally persist a
/// row with a stale id or timestamp.
#[derive(Debug, Clone, Default)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub price: f64,
    pub quantity: i64,
    pub description: String,
    pub document_path: Option<String>,
}

#[derive(Debug, Clone)]
/// One immutable ledger row. There is deliberately no update path for sales:
/// corrections happen through the book's stock, never by rewriting history.
pub struct Sale {
    pub id: i64,
    /// Book the sale belongs to.
    pub book_id: i64,
    /// Title captured via join at query time so the ledger stays readable
    /// in exports.
    pub book_title: String,
    /// Local timestamp formatted as `%Y-%m-%d %H:%M:%S`.
    pub sold_at: String,
    /// Copies sold in this transaction. Always positive.
    pub quantity: i64,
    /// Unit price at the moment of sale. Later price edits do not rewrite
    /// recorded revenue.
    pub unit_price: f64,
    /// `unit_price * quantity`, stored denormalized so reports never depend
    /// on the current catalog.
    pub total: f64,
}

#[derive(Debug, Clone)]
/// Per-book aggregate produced by the reporting queries.
pub struct BookSummary {
    pub book_id: i64,
    pub title: String,
    /// Number of sale transactions.
    pub sale_count: i64,
    /// Total copies sold across those transactions.
    pub units_sold: i64,
    /// Revenue sum over the book's sales.
    pub revenue: f64,
    /// Average order value for this book.
    pub average_order: f64,
}

#[derive(Debug, Clone, Default)]
/// Ledger-wide totals shown on the stats screen.
pub struct LedgerStats {
    pub sale_count: i64,
    pub units_sold: i64,
    pub revenue: f64,
    /// `None` while the ledger is empty so the UI can render a placeholder
    /// instead of a bogus zero average.
    pub average_order: Option<f64>,
}

/// Render a price or revenue amount with two decimals for lists and exports.
pub fn format_money(amount: f64) -> String {
    format!("{amount:.2}")
}
