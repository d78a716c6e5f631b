//! Core types shared by every layer:
//! - event: keyboard, mouse, command and broadcast events
//! - command: command ids and the enabled-command set
//! - config: program configuration
//! - error: engine errors

pub mod command;
pub mod config;
pub mod error;
pub mod event;

pub use command::CommandSet;
pub use config::{ConfigError, ProgramConfig};
pub use error::{Result, ViewError};
pub use event::{Event, Info, KeyCode, KeyEvent, KeyModifiers, Message, MouseEvent};
