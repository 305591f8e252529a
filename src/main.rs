//! Binary entry point that glues the SQLite-backed domain model to the TUI.
//! The bootstrapping pipeline is small: initialize logging, bring up the
//! store (database plus document directory), hydrate the initial app state,
//! and drive the Ratatui event loop until the user exits.
use bookstore_manager::{run_app, App, Store};

/// Initialize persistence, load cached data, and launch the Ratatui event
/// loop.
///
/// Returning a `Result` bubbles up fatal initialization problems (for example
/// an unwritable home directory) to the terminal instead of crashing
/// silently.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let store = Store::open_default()?;
    let books = store.fetch_books()?;

    let mut app = App::new(store, books);
    run_app(&mut app)
}
