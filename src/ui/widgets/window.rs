//! Movable, closable windows and their frames.

use crate::core::command::{CM_CANCEL, CM_CLOSE, CM_SELECT_WINDOW_NUM, CM_ZOOM};
use crate::core::error::Result;
use crate::core::event::{Event, Info, KeyCode, Message, MouseEvent, MouseKind};
use crate::persist::{self, tags, LoadCx, PersistError, SaveCx};
use crate::ui::core::draw_buffer::{cstr_len, Attr, DrawBuffer};
use crate::ui::core::flags::{DragMode, EventMask, GrowMode, Options, StateFlags, WindowFlags};
use crate::ui::core::geom::{Point, Rect};
use crate::ui::core::palette::{self, Palette};
use crate::ui::core::tree::{ViewId, ViewTree};
use crate::ui::core::widget::{DrawCx, Widget};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MIN_WINDOW_SIZE: Point = Point::new(16, 6);

const CLOSE_ICON: &str = "[~■~]";
const ZOOM_ICON: &str = "[~↑~]";
const UNZOOM_ICON: &str = "[~↕~]";
const DRAG_ICON: &str = "~─┘~";

struct FrameChars {
    top: [char; 3],
    middle: [char; 3],
    bottom: [char; 3],
}

const SINGLE: FrameChars = FrameChars {
    top: ['┌', '─', '┐'],
    middle: ['│', ' ', '│'],
    bottom: ['└', '─', '┘'],
};

const DOUBLE: FrameChars = FrameChars {
    top: ['╔', '═', '╗'],
    middle: ['║', ' ', '║'],
    bottom: ['╚', '═', '╝'],
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowPalette {
    #[default]
    Blue,
    Cyan,
    Gray,
}

impl WindowPalette {
    fn table(self) -> Palette {
        match self {
            WindowPalette::Blue => palette::BLUE_WINDOW,
            WindowPalette::Cyan => palette::CYAN_WINDOW,
            WindowPalette::Gray => palette::GRAY_WINDOW,
        }
    }
}

/// The border of a window. Keeps its own copy of the window's title, number
/// and flags so it can draw while the window is busy.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Frame {
    title: String,
    number: Option<u8>,
    flags: WindowFlags,
}

impl Frame {
    pub fn create(tree: &mut ViewTree, bounds: Rect, title: &str, number: Option<u8>, flags: WindowFlags) -> ViewId {
        let frame = Frame {
            title: title.to_string(),
            number,
            flags,
        };
        let id = tree.create(bounds, Box::new(frame));
        tree.set_grow_mode(id, GrowMode::HI_X | GrowMode::HI_Y);
        let mask = tree.event_mask(id) | EventMask::BROADCAST | EventMask::MOUSE_UP;
        tree.set_event_mask(id, mask);
        id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Follow the pointer until release; true if it was let go on the
    /// three-cell icon starting at `x` on the top row.
    fn track_icon(tree: &mut ViewTree, id: ViewId, ev: &mut Event, x: i16) -> bool {
        let mut last = ev.as_mouse().map(|m| m.pos);
        while tree.mouse_event(ev, EventMask::MOUSE_MOVE) {
            last = ev.as_mouse().map(|m| m.pos).or(last);
        }
        if let Some(m) = ev.as_mouse() {
            last = Some(m.pos);
        }
        last.map(|p| tree.make_local(id, p))
            .is_some_and(|p| p.y == 0 && p.x >= x && p.x < x + 3)
    }

    fn post_to_window(tree: &mut ViewTree, window: ViewId, command: u16) {
        tree.put_event(Event::Command(Message::new(command, Info::View(window))));
    }

    fn draw_title(&self, b: &mut DrawBuffer, width: usize, attr: Attr) {
        if self.title.is_empty() || width <= 10 {
            return;
        }
        let len = cstr_len(&self.title).min(width - 10);
        let start = (width - len) / 2;
        let title: String = self.title.chars().filter(|&c| c != '~').take(len).collect();
        b.put_char(start - 1, ' ');
        b.move_str(start, &title, attr);
        b.put_char(start + len, ' ');
    }
}

fn frame_row(b: &mut DrawBuffer, chars: [char; 3], attr: Attr) {
    let w = b.len();
    b.move_char(0, chars[0], attr, 1);
    b.move_char(1, chars[1], attr, w.saturating_sub(2));
    b.move_char(w.saturating_sub(1), chars[2], attr, 1);
}

impl Widget for Frame {
    fn draw(&self, cx: &mut DrawCx<'_>) {
        let size = cx.size();
        if size.x < 2 || size.y < 2 {
            return;
        }
        let state = cx.state();
        let active = state.contains(StateFlags::ACTIVE);
        let (frame_pair, title_pair, chars) = if state.contains(StateFlags::DRAGGING) {
            (0x0505, 0x0005, &SINGLE)
        } else if !active {
            (0x0101, 0x0002, &SINGLE)
        } else {
            (0x0503, 0x0004, &DOUBLE)
        };
        let c_frame = cx.get_color(frame_pair);
        let c_title = cx.get_color(title_pair);
        let width = size.x as usize;
        let mut b = DrawBuffer::new(width);

        frame_row(&mut b, chars.top, c_frame.normal);
        if let Some(n) = self.number.filter(|n| (1..=9).contains(n)) {
            let from_right = if self.flags.contains(WindowFlags::ZOOM) { 7 } else { 3 };
            if let Some(digit) = char::from_digit(u32::from(n), 10) {
                b.put_char(width.saturating_sub(from_right), digit);
            }
        }
        self.draw_title(&mut b, width, c_title.normal);
        if active && !state.contains(StateFlags::DRAGGING) {
            if self.flags.contains(WindowFlags::CLOSE) {
                b.move_cstr(2, CLOSE_ICON, c_frame);
            }
            if self.flags.contains(WindowFlags::ZOOM) {
                let tree = cx.tree();
                let zoomed = tree
                    .owner(cx.id())
                    .is_some_and(|w| tree.size(w) == tree.size_limits(w).1);
                let icon = if zoomed { UNZOOM_ICON } else { ZOOM_ICON };
                b.move_cstr(width.saturating_sub(5), icon, c_frame);
            }
        }
        cx.write_line(0, 0, size.x, 1, &b);

        frame_row(&mut b, chars.middle, c_frame.normal);
        cx.write_line(0, 1, size.x, size.y - 2, &b);

        frame_row(&mut b, chars.bottom, c_frame.normal);
        if active && self.flags.contains(WindowFlags::GROW) {
            b.move_cstr(width.saturating_sub(2), DRAG_ICON, c_frame);
        }
        cx.write_line(0, size.y - 1, size.x, 1, &b);
    }

    fn handle_event(&mut self, tree: &mut ViewTree, id: ViewId, ev: &mut Event) {
        tree.view_handle_event(id, ev);
        let Some(mouse) = ev.as_mouse().copied() else {
            return;
        };
        if mouse.kind != MouseKind::Down {
            return;
        }
        let Some(window) = tree.owner(id) else {
            return;
        };
        let local = tree.make_local(id, mouse.pos);
        let size = tree.size(id);
        let active = tree.state(id).contains(StateFlags::ACTIVE);

        if local.y == 0 {
            if active && self.flags.contains(WindowFlags::CLOSE) && (2..=4).contains(&local.x) {
                if Self::track_icon(tree, id, ev, 2) {
                    Self::post_to_window(tree, window, CM_CLOSE);
                }
                tree.clear_event(id, ev);
            } else if active
                && self.flags.contains(WindowFlags::ZOOM)
                && ((size.x - 5..=size.x - 3).contains(&local.x) || mouse.double)
            {
                if mouse.double || Self::track_icon(tree, id, ev, size.x - 5) {
                    Self::post_to_window(tree, window, CM_ZOOM);
                }
                tree.clear_event(id, ev);
            } else if self.flags.contains(WindowFlags::MOVE) {
                drag_window(tree, id, ev, mouse, window, DragMode::MOVE);
            }
        } else if active
            && self.flags.contains(WindowFlags::GROW)
            && local.x >= size.x - 2
            && local.y >= size.y - 1
        {
            drag_window(tree, id, ev, mouse, window, DragMode::GROW);
        }
    }

    fn palette(&self) -> Palette {
        palette::FRAME
    }

    fn class_tag(&self) -> u16 {
        tags::FRAME
    }

    fn save(&self, _cx: &SaveCx<'_>) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn drag_window(tree: &mut ViewTree, frame: ViewId, ev: &mut Event, start: MouseEvent, window: ViewId, mode: DragMode) {
    tree.request_drag(window, start, mode);
    tree.clear_event(frame, ev);
}

pub(crate) fn construct_frame(data: &Value) -> std::result::Result<Box<dyn Widget>, PersistError> {
    let frame: Frame = persist::decode(tags::FRAME, data)?;
    Ok(Box::new(frame))
}

#[derive(Debug)]
pub struct Window {
    title: String,
    number: Option<u8>,
    flags: WindowFlags,
    /// Bounds to return to when zoomed back out.
    zoom_rect: Rect,
    palette: WindowPalette,
    frame: Option<ViewId>,
}

#[derive(Serialize, Deserialize)]
struct SavedWindow {
    title: String,
    #[serde(default)]
    number: Option<u8>,
    flags: WindowFlags,
    zoom_rect: Rect,
    #[serde(default)]
    palette: WindowPalette,
    #[serde(default)]
    frame: Option<u32>,
}

impl Window {
    fn new(title: &str, number: Option<u8>, bounds: Rect) -> Self {
        Self {
            title: title.to_string(),
            number,
            flags: WindowFlags::ALL,
            zoom_rect: bounds,
            palette: WindowPalette::Blue,
            frame: None,
        }
    }

    /// Create a window with a frame. Insert it into a desktop to show it.
    pub fn create(tree: &mut ViewTree, bounds: Rect, title: &str, number: Option<u8>) -> Result<ViewId> {
        let id = tree.create_group(bounds, Box::new(Self::new(title, number, bounds)));
        let options = tree.options(id) | Options::SELECTABLE | Options::TOP_SELECT;
        tree.set_options(id, options);
        tree.set_grow_mode(id, GrowMode::ALL | GrowMode::REL);
        tree.set_min_size(id, MIN_WINDOW_SIZE);
        tree.set_active_follows_selection(id, true);

        let extent = tree.extent(id);
        let frame = Frame::create(tree, extent, title, number, WindowFlags::ALL);
        tree.insert(id, frame)?;
        if let Some(w) = tree.widget_mut::<Window>(id) {
            w.frame = Some(frame);
        }
        Ok(id)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn number(&self) -> Option<u8> {
        self.number
    }

    pub fn flags(&self) -> WindowFlags {
        self.flags
    }

    pub fn frame(&self) -> Option<ViewId> {
        self.frame
    }

    /// Area inside the frame, in window coordinates.
    pub fn interior(tree: &ViewTree, id: ViewId) -> Rect {
        tree.extent(id).grown(-1, -1)
    }

    pub fn set_title(tree: &mut ViewTree, id: ViewId, title: &str) {
        let Some(w) = tree.widget_mut::<Window>(id) else {
            return;
        };
        w.title = title.to_string();
        Self::sync_frame(tree, id);
    }

    pub fn set_flags(tree: &mut ViewTree, id: ViewId, flags: WindowFlags) {
        let Some(w) = tree.widget_mut::<Window>(id) else {
            return;
        };
        w.flags = flags;
        Self::sync_frame(tree, id);
    }

    pub fn set_palette_kind(tree: &mut ViewTree, id: ViewId, kind: WindowPalette) {
        let Some(w) = tree.widget_mut::<Window>(id) else {
            return;
        };
        w.palette = kind;
        tree.set_palette(id, kind.table());
    }

    fn sync_frame(tree: &mut ViewTree, id: ViewId) {
        let Some(w) = tree.widget::<Window>(id) else {
            return;
        };
        let (title, number, flags, frame) = (w.title.clone(), w.number, w.flags, w.frame);
        let Some(frame) = frame else {
            return;
        };
        if let Some(f) = tree.widget_mut::<Frame>(frame) {
            f.title = title;
            f.number = number;
            f.flags = flags;
        }
        tree.draw_view(frame);
    }

    /// Destroy the window unless it refuses to close.
    pub fn close(tree: &mut ViewTree, id: ViewId) -> bool {
        if !tree.valid(id, CM_CLOSE) {
            return false;
        }
        tracing::debug!(?id, "window closed");
        tree.destroy(id);
        true
    }

    /// Toggle between filling the owner and the remembered bounds.
    fn zoom(&mut self, tree: &mut ViewTree, id: ViewId) {
        let (_, max) = tree.size_limits(id);
        if tree.size(id) != max {
            self.zoom_rect = tree.bounds(id);
            tree.locate(id, Rect::with_size(Point::default(), max));
        } else {
            tree.locate(id, self.zoom_rect);
        }
    }

    pub fn toggle_zoom(tree: &mut ViewTree, id: ViewId) {
        tree.message(id, Event::Command(Message::new(CM_ZOOM, Info::View(id))));
    }
}

impl Widget for Window {
    fn handle_event(&mut self, tree: &mut ViewTree, id: ViewId, ev: &mut Event) {
        tree.group_handle_event(id, ev);
        match *ev {
            Event::Command(message) => {
                let addressed = matches!(message.info, Info::None) || message.info == Info::View(id);
                if !addressed {
                    return;
                }
                if message.command == CM_CLOSE && self.flags.contains(WindowFlags::CLOSE) {
                    tree.clear_event(id, ev);
                    if tree.state(id).contains(StateFlags::MODAL) {
                        tree.put_event(Event::command(CM_CANCEL));
                    } else {
                        Window::close(tree, id);
                    }
                } else if message.command == CM_ZOOM && self.flags.contains(WindowFlags::ZOOM) {
                    self.zoom(tree, id);
                    tree.clear_event(id, ev);
                }
            }
            Event::KeyDown(key) if key.modifiers.is_empty() || key.code == KeyCode::BackTab => {
                match key.code {
                    KeyCode::Tab => {
                        tree.focus_next(id, false);
                        tree.clear_event(id, ev);
                    }
                    KeyCode::BackTab => {
                        tree.focus_next(id, true);
                        tree.clear_event(id, ev);
                    }
                    _ => {}
                }
            }
            Event::Broadcast(message) if message.command == CM_SELECT_WINDOW_NUM => {
                let wanted = match message.info {
                    Info::Value(n) => Some(n),
                    _ => None,
                };
                if wanted.is_some()
                    && wanted == self.number.map(i64::from)
                    && tree.options(id).contains(Options::SELECTABLE)
                {
                    tree.select(id);
                    tree.clear_event(id, ev);
                }
            }
            _ => {}
        }
    }

    fn palette(&self) -> Palette {
        self.palette.table()
    }

    fn class_tag(&self) -> u16 {
        tags::WINDOW
    }

    fn save(&self, cx: &SaveCx<'_>) -> Value {
        let saved = SavedWindow {
            title: self.title.clone(),
            number: self.number,
            flags: self.flags,
            zoom_rect: self.zoom_rect,
            palette: self.palette,
            frame: self.frame.and_then(|f| cx.index_of(f)),
        };
        serde_json::to_value(saved).unwrap_or(Value::Null)
    }

    fn resolve(&mut self, data: &Value, cx: &LoadCx<'_>) -> std::result::Result<(), PersistError> {
        let saved: SavedWindow = persist::decode(tags::WINDOW, data)?;
        self.frame = saved.frame.map(|index| cx.view(index)).transpose()?;
        Ok(())
    }
}

pub(crate) fn construct_window(data: &Value) -> std::result::Result<Box<dyn Widget>, PersistError> {
    let saved: SavedWindow = persist::decode(tags::WINDOW, data)?;
    Ok(Box::new(Window {
        title: saved.title,
        number: saved.number,
        flags: saved.flags,
        zoom_rect: saved.zoom_rect,
        palette: saved.palette,
        frame: None,
    }))
}

#[cfg(test)]
#[path = "../../../tests/unit/ui/widgets/window.rs"]
mod tests;
