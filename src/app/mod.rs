//! Application layer: the program shell around the view engine.

pub mod program;

pub use program::{CommandHook, Program, ProgramView};
