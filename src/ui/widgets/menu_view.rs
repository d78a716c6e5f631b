//! Menu bar and pull-down menu boxes.
//!
//! Both layouts share one widget. Outside a modal loop only the bar is in
//! the tree: it watches for clicks, Alt shortcuts and `CM_MENU`, and turns
//! item hot keys into commands. Opening the menu runs [`execute`], which
//! owns the event loop until an item is chosen or the menu is dismissed.
//! Every opened submenu runs its own nested loop.

use super::menu::Menu;
use crate::core::command::{CM_COMMAND_SET_CHANGED, CM_MENU};
use crate::core::event::{Event, KeyCode, MouseKind};
use crate::persist::{self, tags, LoadCx, PersistError, SaveCx};
use crate::ui::core::draw_buffer::{cstr_len, Attr, ColorPair, DrawBuffer};
use crate::ui::core::flags::{EventMask, GrowMode, Options};
use crate::ui::core::geom::{Point, Rect};
use crate::ui::core::palette::{self, Palette};
use crate::ui::core::tree::{ViewId, ViewTree};
use crate::ui::core::widget::{DrawCx, Executor, Widget};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SUBMENU_MARK: char = '►';

const FRAME_TOP: [char; 5] = [' ', '┌', '─', '┐', ' '];
const FRAME_ITEM: [char; 5] = [' ', '│', ' ', '│', ' '];
const FRAME_SEPARATOR: [char; 5] = [' ', '├', '─', '┤', ' '];
const FRAME_BOTTOM: [char; 5] = [' ', '└', '─', '┘', ' '];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuLayout {
    /// One row across the top of the screen.
    Bar,
    /// A framed vertical list.
    Box,
}

#[derive(Debug)]
pub struct MenuView {
    menu: Menu,
    layout: MenuLayout,
    current: Option<usize>,
    /// The menu this box was opened from.
    parent: Option<ViewId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Nothing,
    Select,
    Return,
}

#[derive(Clone, Copy)]
struct MenuColors {
    normal: ColorPair,
    selected: ColorPair,
    disabled: ColorPair,
    selected_disabled: ColorPair,
}

impl MenuColors {
    fn resolve(cx: &DrawCx<'_>) -> Self {
        Self {
            normal: cx.get_color(0x0301),
            selected: cx.get_color(0x0604),
            disabled: cx.get_color(0x0202),
            selected_disabled: cx.get_color(0x0505),
        }
    }

    fn pick(&self, selected: bool, disabled: bool) -> ColorPair {
        match (selected, disabled) {
            (false, false) => self.normal,
            (true, false) => self.selected,
            (false, true) => self.disabled,
            (true, true) => self.selected_disabled,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Saved {
    menu: Menu,
    layout: MenuLayout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<u32>,
}

impl MenuView {
    fn with_layout(menu: Menu, layout: MenuLayout, parent: Option<ViewId>) -> Self {
        Self {
            menu,
            layout,
            current: None,
            parent,
        }
    }

    /// Create a menu bar. It stretches with its owner's width and sees keys
    /// before the focused view does.
    pub fn bar(tree: &mut ViewTree, bounds: Rect, menu: Menu) -> ViewId {
        let id = tree.create(bounds, Box::new(Self::with_layout(menu, MenuLayout::Bar, None)));
        tree.set_grow_mode(id, GrowMode::HI_X);
        Self::configure(tree, id);
        id
    }

    /// Create a pull-down box for `menu`, placed at the top-left of `area`
    /// and shifted back inside it when it would overflow.
    pub fn pull_down(tree: &mut ViewTree, area: Rect, menu: Menu, parent: Option<ViewId>) -> ViewId {
        let bounds = Self::box_bounds(area, &menu);
        let id = tree.create(bounds, Box::new(Self::with_layout(menu, MenuLayout::Box, parent)));
        Self::configure(tree, id);
        id
    }

    fn configure(tree: &mut ViewTree, id: ViewId) {
        let options = tree.options(id) | Options::PRE_PROCESS;
        tree.set_options(id, options);
        let mask = tree.event_mask(id) | EventMask::BROADCAST;
        tree.set_event_mask(id, mask);
    }

    pub fn box_bounds(area: Rect, menu: &Menu) -> Rect {
        let w = menu.box_width();
        let h = menu.len() as i16 + 2;
        let mut r = area;
        if r.a.x + w < r.b.x {
            r.b.x = r.a.x + w;
        } else {
            r.a.x = r.b.x - w;
        }
        if r.a.y + h < r.b.y {
            r.b.y = r.a.y + h;
        } else {
            r.a.y = r.b.y - h;
        }
        r
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn menu_mut(&mut self) -> &mut Menu {
        &mut self.menu
    }

    pub fn layout(&self) -> MenuLayout {
        self.layout
    }

    /// The highlighted item while the menu runs.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn parent(&self) -> Option<ViewId> {
        self.parent
    }

    /// Area of item `index` in local coordinates.
    pub fn item_rect(&self, size: Point, index: usize) -> Rect {
        match self.layout {
            MenuLayout::Bar => {
                let mut x = 1;
                for (i, item) in self.menu.items.iter().enumerate() {
                    let start = x;
                    if !item.is_separator() {
                        x += cstr_len(&item.name) as i16 + 2;
                    }
                    if i == index {
                        return Rect::new(start, 0, x, 1);
                    }
                }
                Rect::default()
            }
            MenuLayout::Box => {
                let y = index as i16 + 1;
                Rect::new(2, y, size.x - 2, y + 1)
            }
        }
    }

    /// The named item under `local`, if any.
    pub fn item_at(&self, size: Point, local: Point) -> Option<usize> {
        (0..self.menu.len()).find(|&i| {
            !self.menu.items[i].is_separator() && self.item_rect(size, i).contains(local)
        })
    }

    fn draw_bar(&self, cx: &mut DrawCx<'_>) {
        let size = cx.size();
        if size.x <= 0 {
            return;
        }
        let colors = MenuColors::resolve(cx);
        let width = size.x as usize;
        let mut b = DrawBuffer::new(width);
        b.move_char(0, ' ', colors.normal.normal, width);
        let mut x = 1usize;
        for (i, item) in self.menu.items.iter().enumerate() {
            if item.is_separator() {
                continue;
            }
            let len = cstr_len(&item.name);
            if x + len < width {
                let color = colors.pick(self.current == Some(i), item.disabled);
                b.move_char(x, ' ', color.normal, 1);
                b.move_cstr(x + 1, &item.name, color);
                b.move_char(x + len + 1, ' ', color.normal, 1);
            }
            x += len + 2;
        }
        cx.write_line(0, 0, size.x, 1, &b);
    }

    fn draw_box(&self, cx: &mut DrawCx<'_>) {
        let size = cx.size();
        if size.x < 4 || size.y <= 0 {
            return;
        }
        let colors = MenuColors::resolve(cx);
        let border = colors.normal.normal;
        let width = size.x as usize;
        let mut b = DrawBuffer::new(width);

        frame_line(&mut b, FRAME_TOP, border, border);
        cx.write_line(0, 0, size.x, 1, &b);
        let mut y = 1;
        for (i, item) in self.menu.items.iter().enumerate() {
            if item.is_separator() {
                frame_line(&mut b, FRAME_SEPARATOR, border, border);
            } else {
                let color = colors.pick(self.current == Some(i), item.disabled);
                frame_line(&mut b, FRAME_ITEM, border, color.normal);
                b.move_cstr(3, &item.name, color);
                if item.submenu.is_some() {
                    b.put_char(width - 4, SUBMENU_MARK);
                } else if !item.param.is_empty() {
                    let at = width.saturating_sub(3 + cstr_len(&item.param));
                    b.move_str(at, &item.param, color.normal);
                }
            }
            cx.write_line(0, y, size.x, 1, &b);
            y += 1;
        }
        frame_line(&mut b, FRAME_BOTTOM, border, border);
        cx.write_line(0, y, size.x, 1, &b);
    }

    fn open(&self, tree: &mut ViewTree, id: ViewId, ev: &mut Event) {
        tree.put_event(*ev);
        tree.clear_event(id, ev);
        tree.request_exec(id);
    }
}

fn frame_line(b: &mut DrawBuffer, chars: [char; 5], border: Attr, fill: Attr) {
    let w = b.len();
    b.move_char(0, chars[0], border, 1);
    b.move_char(1, chars[1], border, 1);
    b.move_char(2, chars[2], fill, w.saturating_sub(4));
    b.move_char(w.saturating_sub(2), chars[3], border, 1);
    b.move_char(w.saturating_sub(1), chars[4], border, 1);
}

impl Widget for MenuView {
    fn draw(&self, cx: &mut DrawCx<'_>) {
        match self.layout {
            MenuLayout::Bar => self.draw_bar(cx),
            MenuLayout::Box => self.draw_box(cx),
        }
    }

    fn handle_event(&mut self, tree: &mut ViewTree, id: ViewId, ev: &mut Event) {
        match *ev {
            Event::Mouse(mouse) if mouse.kind == MouseKind::Down => self.open(tree, id, ev),
            Event::KeyDown(key) => {
                let opens = key
                    .alt_char()
                    .is_some_and(|ch| self.menu.find_hot(ch).is_some());
                if opens {
                    self.open(tree, id, ev);
                } else if let Some(command) = self.menu.hot_key(&key) {
                    if tree.command_enabled(command) {
                        tree.put_event(Event::command(command));
                        tree.clear_event(id, ev);
                    }
                }
            }
            Event::Command(message) if message.command == CM_MENU => self.open(tree, id, ev),
            Event::Broadcast(message) if message.command == CM_COMMAND_SET_CHANGED => {
                if self.menu.update_disabled(tree.commands()) {
                    tree.draw_self(id, &*self);
                }
            }
            _ => {}
        }
    }

    fn palette(&self) -> Palette {
        palette::MENU_VIEW
    }

    fn executor(&self) -> Option<Executor> {
        Some(execute)
    }

    /// The highlighted item's help id, falling back to the parent menus.
    fn help_ctx(&self, tree: &ViewTree, _id: ViewId) -> Option<u16> {
        let mut menu = self;
        loop {
            if let Some(item) = menu.current.and_then(|i| menu.menu.item(i)) {
                if !item.is_separator() && item.help_ctx != 0 {
                    return Some(item.help_ctx);
                }
            }
            menu = menu.parent.and_then(|p| tree.widget::<MenuView>(p))?;
        }
    }

    fn class_tag(&self) -> u16 {
        tags::MENU_VIEW
    }

    fn save(&self, cx: &SaveCx<'_>) -> Value {
        let saved = Saved {
            menu: self.menu.clone(),
            layout: self.layout,
            parent: self.parent.and_then(|p| cx.index_of(p)),
        };
        serde_json::to_value(saved).unwrap_or(Value::Null)
    }

    fn resolve(&mut self, data: &Value, cx: &LoadCx<'_>) -> Result<(), PersistError> {
        let saved: Saved = persist::decode(tags::MENU_VIEW, data)?;
        self.parent = saved.parent.map(|index| cx.view(index)).transpose()?;
        Ok(())
    }
}

pub(crate) fn construct(data: &Value) -> Result<Box<dyn Widget>, PersistError> {
    let saved: Saved = persist::decode(tags::MENU_VIEW, data)?;
    Ok(Box::new(MenuView::with_layout(saved.menu, saved.layout, None)))
}

fn view(tree: &ViewTree, id: ViewId) -> Option<&MenuView> {
    tree.widget::<MenuView>(id)
}

fn current_of(tree: &ViewTree, id: ViewId) -> Option<usize> {
    view(tree, id).and_then(|v| v.current)
}

fn set_current(tree: &mut ViewTree, id: ViewId, current: Option<usize>) {
    if let Some(v) = tree.widget_mut::<MenuView>(id) {
        v.current = current;
    }
}

fn parent_of(tree: &ViewTree, id: ViewId) -> Option<ViewId> {
    view(tree, id).and_then(|v| v.parent)
}

fn is_bar(tree: &ViewTree, id: ViewId) -> bool {
    view(tree, id).is_some_and(|v| v.layout == MenuLayout::Bar)
}

fn top_menu(tree: &ViewTree, id: ViewId) -> ViewId {
    let mut top = id;
    while let Some(parent) = parent_of(tree, top) {
        top = parent;
    }
    top
}

fn mouse_in_view(tree: &ViewTree, id: ViewId, pos: Point) -> bool {
    tree.extent(id).contains(tree.make_local(id, pos))
}

/// True when the pointer is over the bar item this box hangs from.
fn mouse_in_owner(tree: &ViewTree, id: ViewId, pos: Point) -> bool {
    let Some(parent) = parent_of(tree, id) else {
        return false;
    };
    let Some(pv) = view(tree, parent) else {
        return false;
    };
    if pv.layout != MenuLayout::Bar {
        return false;
    }
    pv.current.is_some_and(|i| {
        pv.item_rect(tree.size(parent), i)
            .contains(tree.make_local(parent, pos))
    })
}

fn mouse_in_menus(tree: &ViewTree, id: ViewId, pos: Point) -> bool {
    let mut cursor = parent_of(tree, id);
    while let Some(menu) = cursor {
        if mouse_in_view(tree, menu, pos) {
            return true;
        }
        cursor = parent_of(tree, menu);
    }
    false
}

fn track_mouse(tree: &mut ViewTree, id: ViewId, pos: Point) {
    let local = tree.make_local(id, pos);
    let size = tree.size(id);
    if let Some(v) = tree.widget_mut::<MenuView>(id) {
        v.current = v.item_at(size, local);
    }
}

fn track_key(tree: &mut ViewTree, id: ViewId, forward: bool) {
    if let Some(v) = tree.widget_mut::<MenuView>(id) {
        v.current = v.menu.step(v.current, forward);
    }
}

fn selectable(tree: &ViewTree, id: ViewId) -> bool {
    view(tree, id)
        .and_then(|v| v.current.and_then(|i| v.menu.item(i)))
        .is_some_and(|item| !item.is_separator() && !item.disabled)
}

/// Run the menu `id` modally. Returns the chosen command, or 0 when the
/// menu was dismissed.
pub fn execute(tree: &mut ViewTree, id: ViewId) -> u16 {
    let Some(v) = tree.widget_mut::<MenuView>(id) else {
        return 0;
    };
    v.current = v.menu.default;
    let bar = v.layout == MenuLayout::Bar;
    let parent = v.parent;

    let mut auto_select = false;
    let mut result = 0u16;
    let mut shown: Option<Option<usize>> = None;
    let mut ev;
    loop {
        let mut action = Action::Nothing;
        ev = tree.get_event();
        match ev {
            Event::Nothing => {
                if tree.input_exhausted() {
                    action = Action::Return;
                }
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseKind::Down => {
                    if mouse_in_view(tree, id, mouse.pos) || mouse_in_owner(tree, id, mouse.pos) {
                        track_mouse(tree, id, mouse.pos);
                        if bar {
                            auto_select = true;
                        }
                    } else {
                        action = Action::Return;
                    }
                }
                MouseKind::Up => {
                    track_mouse(tree, id, mouse.pos);
                    if mouse_in_owner(tree, id, mouse.pos) {
                        let default = view(tree, id).and_then(|v| v.menu.default);
                        set_current(tree, id, default);
                    } else if selectable(tree, id) {
                        action = Action::Select;
                    } else if !mouse_in_view(tree, id, mouse.pos)
                        && !mouse_in_menus(tree, id, mouse.pos)
                    {
                        action = Action::Return;
                    }
                }
                MouseKind::Move if !mouse.buttons.is_empty() => {
                    track_mouse(tree, id, mouse.pos);
                    if !(mouse_in_view(tree, id, mouse.pos) || mouse_in_owner(tree, id, mouse.pos))
                        && mouse_in_menus(tree, id, mouse.pos)
                    {
                        action = Action::Return;
                    }
                }
                _ => {}
            },
            Event::KeyDown(key) => match key.ctrl_to_arrow() {
                code @ (KeyCode::Up | KeyCode::Down) => {
                    if !bar {
                        track_key(tree, id, code == KeyCode::Down);
                    } else if code == KeyCode::Down {
                        auto_select = true;
                    }
                }
                code @ (KeyCode::Left | KeyCode::Right) => {
                    if parent.is_none() {
                        track_key(tree, id, code == KeyCode::Right);
                    } else {
                        action = Action::Return;
                    }
                }
                code @ (KeyCode::Home | KeyCode::End) => {
                    if !bar {
                        if let Some(v) = tree.widget_mut::<MenuView>(id) {
                            v.current = v.menu.step(None, code == KeyCode::Home);
                        }
                    }
                }
                KeyCode::Enter => {
                    if bar {
                        auto_select = true;
                    }
                    action = Action::Select;
                }
                KeyCode::Esc => {
                    action = Action::Return;
                    if !parent.is_some_and(|p| is_bar(tree, p)) {
                        tree.clear_event(id, &mut ev);
                    }
                }
                _ => {
                    let top = top_menu(tree, id);
                    let (target, ch) = match key.alt_char() {
                        Some(ch) => (top, Some(ch)),
                        None => (id, key.char_code()),
                    };
                    let found = ch.and_then(|ch| view(tree, target).and_then(|v| v.menu.find_hot(ch)));
                    match found {
                        None => {
                            let hot = view(tree, top).and_then(|v| v.menu.hot_key(&key));
                            if let Some(command) = hot {
                                if tree.command_enabled(command) {
                                    result = command;
                                    action = Action::Return;
                                }
                            }
                        }
                        Some(index) if target == id => {
                            if bar {
                                auto_select = true;
                            }
                            action = Action::Select;
                            set_current(tree, id, Some(index));
                        }
                        Some(index) => {
                            if parent != Some(target) || current_of(tree, target) != Some(index) {
                                action = Action::Return;
                            }
                        }
                    }
                }
            },
            Event::Command(message) => {
                if message.command == CM_MENU {
                    auto_select = false;
                    if parent.is_some() {
                        action = Action::Return;
                    }
                } else {
                    action = Action::Return;
                }
            }
            Event::Broadcast(_) => {}
        }

        let current = current_of(tree, id);
        if shown != Some(current) {
            shown = Some(current);
            tree.draw_view(id);
            tree.flush();
        }

        if action == Action::Select || (action == Action::Nothing && auto_select) {
            let item = current.and_then(|i| view(tree, id).and_then(|v| v.menu.item(i)).cloned());
            if let (Some(index), Some(item)) = (current, item) {
                if !item.is_separator() {
                    if let Some(submenu) = item.submenu {
                        if matches!(ev, Event::Mouse(m) if matches!(m.kind, MouseKind::Down | MouseKind::Move)) {
                            tree.put_event(ev);
                        }
                        result = open_submenu(tree, id, index, submenu);
                    } else if action == Action::Select && !item.disabled {
                        result = item.command;
                    }
                }
            }
        }

        if result != 0 && tree.command_enabled(result) {
            action = Action::Return;
            tree.clear_event(id, &mut ev);
        } else {
            result = 0;
        }
        if action == Action::Return || !tree.contains(id) {
            break;
        }
    }

    if !ev.is_nothing() && (parent.is_some() || matches!(ev, Event::Command(_))) {
        tree.put_event(ev);
    }
    if let Some(v) = tree.widget_mut::<MenuView>(id) {
        if v.current.is_some() {
            v.menu.default = v.current;
            v.current = None;
        }
    }
    tree.draw_view(id);
    tracing::debug!(?id, result, "menu closed");
    result
}

/// Open the submenu of item `index` below it and run it. The item the
/// submenu ended on becomes its default for next time.
fn open_submenu(tree: &mut ViewTree, id: ViewId, index: usize, submenu: Menu) -> u16 {
    let Some(owner) = tree.owner(id) else {
        return 0;
    };
    let Some(v) = view(tree, id) else {
        return 0;
    };
    let origin = tree.origin(id);
    let mut r = v.item_rect(tree.size(id), index);
    if v.layout == MenuLayout::Bar {
        r.a.x -= 1;
    }
    r.a.x += origin.x;
    r.a.y = r.b.y + origin.y;
    r.b = tree.size(owner);

    let sub = MenuView::pull_down(tree, r, submenu, Some(id));
    let result = tree.exec_view(owner, sub);
    let remembered = view(tree, sub).and_then(|s| s.menu.default);
    if let Some(item) = tree
        .widget_mut::<MenuView>(id)
        .and_then(|v| v.menu.items.get_mut(index))
    {
        if let Some(menu) = item.submenu.as_mut() {
            menu.default = remembered;
        }
    }
    tree.destroy(sub);
    result
}

#[cfg(test)]
#[path = "../../../tests/unit/ui/widgets/menu_view.rs"]
mod tests;
