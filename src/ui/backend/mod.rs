//! Output sinks and input sources.
//!
//! The view tree only ever talks to these two traits, so the engine runs the
//! same against a real terminal and against the in-memory test doubles.

use crate::core::event::Event;
use crate::ui::core::draw_buffer::Cell;
use crate::ui::core::geom::Point;
use crate::ui::core::widget::AsAny;
use std::io;

pub trait Backend: AsAny {
    /// Copy a `width` x `height` block of cells (row major) to the screen at
    /// `(x, y)`. Committing the same block twice leaves the screen unchanged.
    fn commit(&mut self, x: i16, y: i16, width: u16, height: u16, cells: &[Cell]);

    fn set_cursor(&mut self, pos: Option<Point>);

    /// The device changed size; contents are undefined until repainted.
    fn resize(&mut self, _width: u16, _height: u16) {}

    /// Push committed cells out to the device.
    fn present(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub trait EventSource {
    /// The next input event, or `None` when nothing arrived in time.
    fn poll_event(&mut self) -> Option<Event>;

    /// A closed source will never produce another event.
    fn is_closed(&self) -> bool {
        false
    }
}

// The concrete terminal backend lives in `ratatui.rs`, but the module name
// stays generic so callers never mention ratatui.
#[cfg(feature = "tui")]
#[path = "ratatui.rs"]
pub mod terminal;
