//! Core library surface for the Bookstore Manager TUI application.
//!
//! The public modules exposed here provide an intentionally small API so the
//! `bin` target as well as potential external tooling can reuse the same
//! pieces: the SQLite-backed [`db::Store`], the managed document directory,
//! and the CSV reporting helpers.
pub mod db;
pub mod documents;
pub mod error;
pub mod models;
pub mod report;
pub mod ui;

/// The persistence object `main.rs` constructs and threads into the UI.
pub use db::Store;

/// Managed directory for files attached to catalog entries.
pub use documents::DocumentStore;

/// Typed failures callers can branch on.
pub use error::{DocumentError, LedgerError};

/// The primary domain types that other layers manipulate.
pub use models::{Book, BookFields, BookSummary, LedgerStats, Sale};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
