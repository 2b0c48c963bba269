//! Terminal front end using Ratatui: editor, language selector, run action, output panel.

pub mod app;
pub mod events;
pub mod handler;
pub mod ui;

pub use handler::run_tui;
