//! Terminal integration (crossterm input, terminal mode switching).
//!
//! Kept apart from `ui` so the engine builds and tests without a terminal.

pub mod crossterm;
pub mod terminal_guard;

pub use self::crossterm::CrosstermSource;
pub use terminal_guard::{Restorer, TerminalSession};
