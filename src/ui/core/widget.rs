use super::draw_buffer::{Attr, Cell, ColorPair, DrawBuffer};
use super::flags::StateFlags;
use super::geom::Point;
use super::palette::Palette;
use super::tree::{ViewId, ViewTree};
use crate::core::event::Event;
use crate::persist::{tags, LoadCx, PersistError, SaveCx};
use std::any::Any;
use std::fmt;

pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Runs a view modally and returns the command that ended it.
pub type Executor = fn(&mut ViewTree, ViewId) -> u16;

/// Behaviour attached to a node of the view tree.
///
/// The tree owns geometry, flags and the child list; a widget only decides how
/// its node draws and reacts. While a widget's own method runs, the widget is
/// detached from its node: redraw requests for that node are deferred until it
/// is put back, unless the widget draws itself with [`ViewTree::draw_self`].
pub trait Widget: AsAny + fmt::Debug {
    /// Fill every cell of the view. Groups compose their children.
    fn draw(&self, cx: &mut DrawCx<'_>) {
        if cx.is_group() {
            cx.draw_group();
        } else {
            cx.fill(' ', 1);
        }
    }

    fn handle_event(&mut self, tree: &mut ViewTree, id: ViewId, ev: &mut Event) {
        tree.default_handle_event(id, ev);
    }

    /// Copied into the node on creation; later changes go through
    /// `ViewTree::set_palette`.
    fn palette(&self) -> Palette {
        Palette::EMPTY
    }

    /// Veto hook consulted before closing or giving up focus.
    fn valid(&mut self, _command: u16) -> bool {
        true
    }

    fn executor(&self) -> Option<Executor> {
        None
    }

    /// Context help override; `None` falls back to the node's help id.
    fn help_ctx(&self, _tree: &ViewTree, _id: ViewId) -> Option<u16> {
        None
    }

    /// Called while the event loop has nothing to do (status line only).
    fn idle(&mut self, _tree: &mut ViewTree, _id: ViewId) {}

    fn class_tag(&self) -> u16;

    fn save(&self, _cx: &SaveCx<'_>) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Second load phase: turn saved indices back into live ids.
    fn resolve(&mut self, _data: &serde_json::Value, _cx: &LoadCx<'_>) -> Result<(), PersistError> {
        Ok(())
    }
}

/// A view with no behaviour of its own: paints itself in colour 1.
#[derive(Debug, Default)]
pub struct PlainView;

impl Widget for PlainView {
    fn class_tag(&self) -> u16 {
        tags::VIEW
    }
}

/// A group with only the stock routing and composition.
#[derive(Debug, Default)]
pub struct PlainGroup;

impl Widget for PlainGroup {
    fn class_tag(&self) -> u16 {
        tags::GROUP
    }
}

pub struct DrawCx<'a> {
    tree: &'a mut ViewTree,
    id: ViewId,
}

impl<'a> DrawCx<'a> {
    pub(crate) fn new(tree: &'a mut ViewTree, id: ViewId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn tree(&self) -> &ViewTree {
        self.tree
    }

    pub fn size(&self) -> Point {
        self.tree.size(self.id)
    }

    pub fn state(&self) -> StateFlags {
        self.tree.state(self.id)
    }

    pub fn is_group(&self) -> bool {
        self.tree.is_group(self.id)
    }

    pub fn map_color(&self, index: u8) -> Attr {
        self.tree.map_color(self.id, index)
    }

    /// Resolve a packed request: low byte normal, high byte highlight.
    pub fn get_color(&self, pair: u16) -> ColorPair {
        self.tree.get_color(self.id, pair)
    }

    pub fn command_enabled(&self, command: u16) -> bool {
        self.tree.command_enabled(command)
    }

    /// Write the same line into `h` consecutive rows.
    pub fn write_line(&mut self, x: i16, y: i16, w: i16, h: i16, buf: &DrawBuffer) {
        let cells = &buf.cells()[..buf.len().min(w.max(0) as usize)];
        for row in 0..h.max(0) {
            self.tree.write_row(self.id, y + row, x, x + w, cells, x);
        }
    }

    /// Write a `w` x `h` block stored row by row.
    pub fn write_buf(&mut self, x: i16, y: i16, w: i16, h: i16, cells: &[Cell]) {
        self.tree.write_rows(self.id, x, y, w, h, cells);
    }

    pub fn write_char(&mut self, x: i16, y: i16, ch: char, color: u8, count: i16) {
        if count <= 0 {
            return;
        }
        let mut buf = DrawBuffer::new(count as usize);
        buf.move_char(0, ch, self.map_color(color), count as usize);
        self.write_line(x, y, count, 1, &buf);
    }

    pub fn write_str(&mut self, x: i16, y: i16, text: &str, color: u8) {
        let len = text.chars().count();
        let mut buf = DrawBuffer::new(len);
        buf.move_str(0, text, self.map_color(color));
        self.write_line(x, y, len as i16, 1, &buf);
    }

    pub fn fill(&mut self, ch: char, color: u8) {
        let size = self.size();
        if size.x <= 0 || size.y <= 0 {
            return;
        }
        let mut buf = DrawBuffer::new(size.x as usize);
        buf.move_char(0, ch, self.map_color(color), size.x as usize);
        self.write_line(0, 0, size.x, size.y, &buf);
    }

    /// Compose the children of this group and copy the result to its owner.
    pub fn draw_group(&mut self) {
        self.tree.draw_group(self.id);
    }
}
