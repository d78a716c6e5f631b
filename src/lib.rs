//! tvkit - a character-cell view toolkit.
//!
//! Module layout:
//! - core: events, commands, configuration and errors
//! - ui: the view engine, stock widgets and rendering sinks
//! - persist: saving and restoring view trees
//! - app: the program shell (menu bar, desktop, status line)
//! - tui: crossterm input and terminal mode handling

pub mod app;
pub mod core;
pub mod logging;
pub mod persist;
#[cfg(feature = "tui")]
pub mod tui;
pub mod ui;
