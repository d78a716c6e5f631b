//! UI layer.
//!
//! `core` holds the view tree engine, `widgets` the stock views built on it
//! and `backend` the rendering sinks and input sources the engine talks to.

pub mod core;

pub mod backend;

pub mod widgets;
