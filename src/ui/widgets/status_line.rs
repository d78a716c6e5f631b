//! The status line: key hints that follow the help context of the top view.

use crate::core::command::CM_COMMAND_SET_CHANGED;
use crate::core::event::{Event, KeyEvent, MouseKind};
use crate::persist::{self, tags, PersistError, SaveCx};
use crate::ui::core::draw_buffer::{cstr_len, ColorPair, DrawBuffer};
use crate::ui::core::flags::{EventMask, GrowMode, Options};
use crate::ui::core::geom::{Point, Rect};
use crate::ui::core::palette::{self, Palette};
use crate::ui::core::tree::{ViewId, ViewTree, HC_NO_CONTEXT};
use crate::ui::core::widget::{DrawCx, Widget};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const HINT_SEPARATOR: &str = "│ ";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusItem {
    /// Label with `~` markers. Empty items only bind a key.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyEvent>,
    pub command: u16,
}

impl StatusItem {
    pub fn new(text: impl Into<String>, key: Option<KeyEvent>, command: u16) -> Self {
        Self {
            text: text.into(),
            key,
            command,
        }
    }
}

/// Items shown while the help context lies in `min..=max`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusDef {
    pub min: u16,
    pub max: u16,
    pub items: Vec<StatusItem>,
}

impl StatusDef {
    pub fn new(min: u16, max: u16, items: Vec<StatusItem>) -> Self {
        Self { min, max, items }
    }

    pub fn contains(&self, help_ctx: u16) -> bool {
        (self.min..=self.max).contains(&help_ctx)
    }
}

#[derive(Debug)]
pub struct StatusLine {
    defs: Vec<StatusDef>,
    /// Index of the definition in use.
    active: Option<usize>,
    help_ctx: u16,
    hints: FxHashMap<u16, String>,
    /// Item under the pointer while a click is tracked.
    selected: Option<usize>,
}

#[derive(Serialize, Deserialize)]
struct Saved {
    defs: Vec<StatusDef>,
    #[serde(default)]
    hints: FxHashMap<u16, String>,
}

impl StatusLine {
    fn from_defs(defs: Vec<StatusDef>, hints: FxHashMap<u16, String>) -> Self {
        let mut line = Self {
            defs,
            active: None,
            help_ctx: HC_NO_CONTEXT,
            hints,
            selected: None,
        };
        line.find_items();
        line
    }

    /// Create a status line. Register it with
    /// [`ViewTree::set_status_line`] so it sees keys first and idles.
    pub fn create(tree: &mut ViewTree, bounds: Rect, defs: Vec<StatusDef>) -> ViewId {
        let id = tree.create(bounds, Box::new(Self::from_defs(defs, FxHashMap::default())));
        tree.set_grow_mode(id, GrowMode::LO_Y | GrowMode::HI_X | GrowMode::HI_Y);
        let options = tree.options(id) | Options::PRE_PROCESS;
        tree.set_options(id, options);
        let mask = tree.event_mask(id) | EventMask::BROADCAST;
        tree.set_event_mask(id, mask);
        id
    }

    pub fn help_ctx(&self) -> u16 {
        self.help_ctx
    }

    /// Text shown after the items while `help_ctx` is active.
    pub fn set_hint(&mut self, help_ctx: u16, hint: impl Into<String>) {
        self.hints.insert(help_ctx, hint.into());
    }

    pub fn hint(&self, help_ctx: u16) -> &str {
        self.hints.get(&help_ctx).map(String::as_str).unwrap_or("")
    }

    /// Items of the definition matching the current help context.
    pub fn items(&self) -> &[StatusItem] {
        self.active
            .and_then(|i| self.defs.get(i))
            .map(|d| d.items.as_slice())
            .unwrap_or(&[])
    }

    fn find_items(&mut self) {
        self.active = self.defs.iter().position(|d| d.contains(self.help_ctx));
    }

    /// Switch to the definition for `help_ctx`. Returns true on a change.
    pub fn update(&mut self, help_ctx: u16) -> bool {
        if self.help_ctx == help_ctx {
            return false;
        }
        self.help_ctx = help_ctx;
        self.find_items();
        true
    }

    /// The labelled item whose cell span on row 0 covers `local`.
    pub fn item_at(&self, local: Point) -> Option<usize> {
        if local.y != 0 {
            return None;
        }
        let mut x = 0i16;
        for (i, item) in self.items().iter().enumerate() {
            if item.text.is_empty() {
                continue;
            }
            let end = x + cstr_len(&item.text) as i16 + 2;
            if local.x >= x && local.x < end {
                return Some(i);
            }
            x = end;
        }
        None
    }
}

impl Widget for StatusLine {
    fn draw(&self, cx: &mut DrawCx<'_>) {
        let size = cx.size();
        if size.x <= 0 {
            return;
        }
        let normal = cx.get_color(0x0301);
        let select = cx.get_color(0x0604);
        let normal_disabled = cx.get_color(0x0202);
        let select_disabled = cx.get_color(0x0505);
        let width = size.x as usize;
        let mut b = DrawBuffer::new(width);
        b.move_char(0, ' ', normal.normal, width);

        let mut x = 0usize;
        for (i, item) in self.items().iter().enumerate() {
            if item.text.is_empty() {
                continue;
            }
            let len = cstr_len(&item.text);
            if x + len < width {
                let selected = self.selected == Some(i);
                let color: ColorPair = match (cx.command_enabled(item.command), selected) {
                    (true, false) => normal,
                    (true, true) => select,
                    (false, false) => normal_disabled,
                    (false, true) => select_disabled,
                };
                b.move_char(x, ' ', color.normal, 1);
                b.move_cstr(x + 1, &item.text, color);
                b.move_char(x + len + 1, ' ', color.normal, 1);
            }
            x += len + 2;
        }

        let hint = self.hint(self.help_ctx);
        if !hint.is_empty() && x + 2 < width {
            b.move_str(x, HINT_SEPARATOR, normal.normal);
            b.move_str(x + 2, hint, normal.normal);
        }
        cx.write_line(0, 0, size.x, 1, &b);
    }

    fn handle_event(&mut self, tree: &mut ViewTree, id: ViewId, ev: &mut Event) {
        tree.view_handle_event(id, ev);
        match *ev {
            Event::Mouse(mouse) if mouse.kind == MouseKind::Down => {
                let mut tracked = None;
                loop {
                    if let Some(m) = ev.as_mouse() {
                        let hit = self.item_at(tree.make_local(id, m.pos));
                        if hit != tracked {
                            tracked = hit;
                            self.selected = hit;
                            tree.draw_self(id, &*self);
                            tree.flush();
                        }
                    }
                    if ev.as_mouse().is_some_and(|m| m.kind == MouseKind::Up) {
                        break;
                    }
                    // The release itself is hit-tested before leaving.
                    if !tree.mouse_event(ev, EventMask::MOUSE_MOVE) && ev.as_mouse().is_none() {
                        break;
                    }
                }
                let command = tracked.and_then(|i| self.items().get(i)).map(|item| item.command);
                if let Some(command) = command.filter(|&c| tree.command_enabled(c)) {
                    tracing::debug!(command, "status item clicked");
                    tree.put_event(Event::command(command));
                }
                self.selected = None;
                tree.clear_event(id, ev);
                tree.draw_self(id, &*self);
            }
            Event::KeyDown(key) => {
                let bound = self.items().iter().find(|item| {
                    item.key.is_some_and(|k| k.matches(&key)) && tree.command_enabled(item.command)
                });
                if let Some(item) = bound {
                    *ev = Event::command(item.command);
                }
            }
            Event::Broadcast(message) if message.command == CM_COMMAND_SET_CHANGED => {
                tree.draw_self(id, &*self);
            }
            _ => {}
        }
    }

    fn palette(&self) -> Palette {
        palette::STATUS_LINE
    }

    fn idle(&mut self, tree: &mut ViewTree, id: ViewId) {
        let help_ctx = tree
            .top_view()
            .map(|top| tree.help_ctx(top))
            .unwrap_or(HC_NO_CONTEXT);
        if self.update(help_ctx) {
            tracing::trace!(help_ctx, "status line context changed");
            tree.draw_self(id, &*self);
        }
    }

    fn class_tag(&self) -> u16 {
        tags::STATUS_LINE
    }

    fn save(&self, _cx: &SaveCx<'_>) -> Value {
        let saved = Saved {
            defs: self.defs.clone(),
            hints: self.hints.clone(),
        };
        serde_json::to_value(saved).unwrap_or(Value::Null)
    }
}

pub(crate) fn construct(data: &Value) -> Result<Box<dyn Widget>, PersistError> {
    let saved: Saved = persist::decode(tags::STATUS_LINE, data)?;
    Ok(Box::new(StatusLine::from_defs(saved.defs, saved.hints)))
}

#[cfg(test)]
#[path = "../../../tests/unit/ui/widgets/status_line.rs"]
mod tests;
