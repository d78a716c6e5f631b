//! The view engine: arena, drawing, focus and event routing.

pub mod dispatch;
pub mod draw_buffer;
pub mod flags;
pub mod focus;
pub mod geom;
pub mod palette;
pub mod redraw;
pub mod tree;
pub mod widget;

pub use draw_buffer::{Attr, Cell, ColorPair, DrawBuffer};
pub use flags::{DragMode, EventMask, GrowMode, Options, StateFlags, WindowFlags};
pub use geom::{Point, Rect};
pub use palette::Palette;
pub use tree::{Phase, SelectMode, ViewId, ViewTree};
pub use widget::{DrawCx, PlainGroup, PlainView, Widget};
