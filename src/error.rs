//! Typed errors the rest of the application matches on. Everything else is
//! reported through `anyhow` with context strings; these variants exist for
//! the cases where a caller needs to branch on the failure instead of just
//! showing it.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of the sale/inventory ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The requested quantity exceeds the copies currently in stock. The
    /// sale is rejected and the stock stays untouched.
    #[error("insufficient stock: requested {requested}, only {available} available")]
    InsufficientStock { requested: i64, available: i64 },

    /// The referenced book does not exist (deleted or never created).
    #[error("book {0} not found")]
    BookNotFound(i64),

    /// Zero or negative quantities never make sense for a sale.
    #[error("sale quantity must be positive, got {0}")]
    InvalidQuantity(i64),
}

/// Failures of the managed document directory.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("source file does not exist: {0}")]
    SourceMissing(PathBuf),

    #[error("source is not a regular file: {0}")]
    NotAFile(PathBuf),

    /// Removal is only allowed for paths inside the managed directory, so a
    /// corrupt database row can never delete arbitrary files.
    #[error("path is outside the managed document directory: {0}")]
    OutsideStore(PathBuf),
}
