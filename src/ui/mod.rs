//! Ratatui front end split across logical submodules: the central [`App`]
//! state machine, the form state types, per-screen view state, layout
//! helpers, and the terminal lifecycle.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
