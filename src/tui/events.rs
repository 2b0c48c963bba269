//! Custom event types for TUI application.

use crossterm::event::KeyEvent;

use crate::session::{Availability, Notice};

/// Events that can occur in the TUI application
#[derive(Debug)]
pub enum TuiEvent {
    /// User keyboard input
    Key(KeyEvent),
    /// Bracketed paste content
    Paste(String),
    /// Health probe finished
    AvailabilityResolved(Availability),
    /// An execute call returned (or was rejected)
    ExecutionFinished(Notice),
}
