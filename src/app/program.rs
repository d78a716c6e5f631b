//! The top-level program: a root group holding the menu bar, the desktop and
//! the status line, wired to a rendering sink and an input source.

use crate::core::command::{
    CM_CANCEL, CM_QUIT, CM_RELEASED_FOCUS, CM_SCREEN_RESIZED, CM_SELECT_WINDOW_NUM, CM_VALID,
};
use crate::core::config::ProgramConfig;
use crate::core::error::{Result, ViewError};
use crate::core::event::{Event, Info, Message};
use crate::persist::{self, tags, LoadCx, PersistError, Registry, SaveCx};
use crate::ui::backend::{Backend, EventSource};
use crate::ui::core::geom::{Point, Rect};
use crate::ui::core::palette::{self, Palette};
use crate::ui::core::tree::{ViewId, ViewTree};
use crate::ui::core::widget::Widget;
use crate::ui::widgets::{Desktop, Menu, MenuView, StatusDef, StatusLine};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Called with every command nothing else consumed. Return true to mark it
/// handled. The root widget is passed directly since it is busy while the
/// hook runs.
pub type CommandHook = fn(&mut ViewTree, &ProgramView, &Message) -> bool;

/// Widget of the root group.
#[derive(Debug, Default)]
pub struct ProgramView {
    desktop: Option<ViewId>,
    menu_bar: Option<ViewId>,
    status_line: Option<ViewId>,
    on_command: Option<CommandHook>,
}

#[derive(Serialize, Deserialize)]
struct Saved {
    desktop: Option<u32>,
    menu_bar: Option<u32>,
    status_line: Option<u32>,
}

impl ProgramView {
    pub fn desktop(&self) -> Option<ViewId> {
        self.desktop
    }

    pub fn menu_bar(&self) -> Option<ViewId> {
        self.menu_bar
    }

    pub fn status_line(&self) -> Option<ViewId> {
        self.status_line
    }
}

impl Widget for ProgramView {
    fn handle_event(&mut self, tree: &mut ViewTree, id: ViewId, ev: &mut Event) {
        if let Event::KeyDown(key) = *ev {
            let digit = key.alt_char().and_then(|c| c.to_digit(10)).filter(|&n| n >= 1);
            if let (Some(n), Some(desktop)) = (digit, self.desktop) {
                let select = Event::broadcast(CM_SELECT_WINDOW_NUM, Info::Value(i64::from(n)));
                if tree.message(desktop, select).is_some() {
                    tree.clear_event(id, ev);
                    return;
                }
            }
        }

        tree.group_handle_event(id, ev);

        let Event::Command(message) = *ev else {
            return;
        };
        match message.command {
            CM_QUIT => {
                tracing::info!("quit requested");
                tree.end_modal(id, CM_QUIT);
                tree.clear_event(id, ev);
            }
            CM_SCREEN_RESIZED => {
                if let Some(size) = message.info.as_size() {
                    resize_screen(tree, id, size);
                }
                tree.clear_event(id, ev);
            }
            _ => {
                if let Some(hook) = self.on_command {
                    if hook(tree, &*self, &message) {
                        tree.clear_event(id, ev);
                    }
                }
            }
        }
    }

    fn palette(&self) -> Palette {
        palette::APP_COLOR
    }

    fn class_tag(&self) -> u16 {
        tags::PROGRAM
    }

    fn save(&self, cx: &SaveCx<'_>) -> Value {
        let saved = Saved {
            desktop: self.desktop.and_then(|v| cx.index_of(v)),
            menu_bar: self.menu_bar.and_then(|v| cx.index_of(v)),
            status_line: self.status_line.and_then(|v| cx.index_of(v)),
        };
        serde_json::to_value(saved).unwrap_or(Value::Null)
    }

    fn resolve(&mut self, data: &Value, cx: &LoadCx<'_>) -> std::result::Result<(), PersistError> {
        let saved: Saved = persist::decode(tags::PROGRAM, data)?;
        self.desktop = saved.desktop.map(|i| cx.view(i)).transpose()?;
        self.menu_bar = saved.menu_bar.map(|i| cx.view(i)).transpose()?;
        self.status_line = saved.status_line.map(|i| cx.view(i)).transpose()?;
        Ok(())
    }
}

pub(crate) fn construct(_data: &Value) -> std::result::Result<Box<dyn Widget>, PersistError> {
    Ok(Box::new(ProgramView::default()))
}

/// Follow a terminal resize: the sink first, then the root and everything
/// that grows with it.
fn resize_screen(tree: &mut ViewTree, root: ViewId, size: Point) {
    if size.x <= 0 || size.y <= 0 || tree.size(root) == size {
        return;
    }
    tracing::debug!(width = size.x, height = size.y, "screen resized");
    if let Some(backend) = tree.backend_mut() {
        backend.resize(size.x as u16, size.y as u16);
    }
    tree.change_bounds(root, Rect::with_size(Point::default(), size));
    tree.draw_view(root);
}

/// Rectangles of the three standard parts for a screen of `size`.
fn layout(size: Point) -> (Rect, Rect, Rect) {
    let menu = Rect::new(0, 0, size.x, 1);
    let desktop = Rect::new(0, 1, size.x, size.y - 1);
    let status = Rect::new(0, size.y - 1, size.x, size.y);
    (menu, desktop, status)
}

pub struct Program {
    tree: ViewTree,
    root: ViewId,
}

impl Program {
    pub fn new(size: Point, config: &ProgramConfig, menu: Menu, status: Vec<StatusDef>) -> Result<Self> {
        let mut tree = ViewTree::new();
        let root = tree.create_group(Rect::with_size(Point::default(), size), Box::new(ProgramView::default()));
        let (menu_rect, desktop_rect, status_rect) = layout(size);

        let desktop = Desktop::create(&mut tree, desktop_rect, config.desktop_pattern)?;
        let menu_bar = MenuView::bar(&mut tree, menu_rect, menu);
        let status_line = StatusLine::create(&mut tree, status_rect, status);
        // Menu bar and status line stay in front of the desktop.
        tree.insert(root, desktop)?;
        tree.insert(root, status_line)?;
        tree.insert(root, menu_bar)?;

        if let Some(view) = tree.widget_mut::<ProgramView>(root) {
            view.desktop = Some(desktop);
            view.menu_bar = Some(menu_bar);
            view.status_line = Some(status_line);
        }
        tree.set_status_line(Some(status_line));
        tree.set_root(root)?;
        tree.select(desktop);
        tracing::debug!(width = size.x, height = size.y, "program created");
        Ok(Self { tree, root })
    }

    /// Rebuild a program saved with [`Program::save`].
    pub fn restore(text: &str, registry: &Registry) -> std::result::Result<Self, PersistError> {
        let mut tree = ViewTree::new();
        let root = persist::from_json(&mut tree, registry, text)?;
        if tree.widget::<ProgramView>(root).is_none() {
            tree.destroy(root);
            return Err(PersistError::View(ViewError::UnknownView(root)));
        }
        let status_line = tree.widget::<ProgramView>(root).and_then(|v| v.status_line);
        tree.set_status_line(status_line);
        tree.set_root(root)?;
        Ok(Self { tree, root })
    }

    pub fn save(&self) -> std::result::Result<String, PersistError> {
        persist::to_json(&self.tree, self.root)
    }

    pub fn tree(&self) -> &ViewTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ViewTree {
        &mut self.tree
    }

    pub fn root(&self) -> ViewId {
        self.root
    }

    fn parts(&self) -> Option<&ProgramView> {
        self.tree.widget::<ProgramView>(self.root)
    }

    pub fn desktop(&self) -> Option<ViewId> {
        self.parts().and_then(|p| p.desktop)
    }

    pub fn menu_bar(&self) -> Option<ViewId> {
        self.parts().and_then(|p| p.menu_bar)
    }

    pub fn status_line(&self) -> Option<ViewId> {
        self.parts().and_then(|p| p.status_line)
    }

    /// Handle commands the standard views leave alone.
    pub fn on_command(&mut self, hook: CommandHook) {
        if let Some(view) = self.tree.widget_mut::<ProgramView>(self.root) {
            view.on_command = Some(hook);
        }
    }

    /// Attach the terminal (or a test double) and paint everything.
    pub fn set_io(&mut self, backend: Box<dyn Backend>, source: Box<dyn EventSource>) {
        self.tree.set_backend(backend);
        self.tree.set_event_source(source);
        self.tree.draw_view(self.root);
        self.tree.flush();
    }

    /// Insert `view` into the desktop if it validates and focus may move.
    /// A refused view is destroyed.
    pub fn insert_window(&mut self, view: ViewId) -> Option<ViewId> {
        let desktop = self.desktop()?;
        if !self.tree.valid(view, CM_VALID) || !self.tree.valid(desktop, CM_RELEASED_FOCUS) {
            tracing::debug!(?view, "window refused");
            self.tree.destroy(view);
            return None;
        }
        match self.tree.insert(desktop, view) {
            Ok(()) => Some(view),
            Err(err) => {
                tracing::warn!(%err, "cannot insert window");
                self.tree.destroy(view);
                None
            }
        }
    }

    /// Run `view` modally on the desktop, destroy it and return the command
    /// that ended it.
    pub fn exec_dialog(&mut self, view: ViewId) -> u16 {
        let Some(desktop) = self.desktop() else {
            self.tree.destroy(view);
            return CM_CANCEL;
        };
        if !self.tree.valid(view, CM_VALID) {
            self.tree.destroy(view);
            return CM_CANCEL;
        }
        let result = self.tree.exec_view(desktop, view);
        self.tree.destroy(view);
        result
    }

    /// Follow a new screen size outside the event loop.
    pub fn resize(&mut self, size: Point) {
        resize_screen(&mut self.tree, self.root, size);
        self.tree.flush();
    }

    /// Pump events until quit or until the input runs dry. Returns the
    /// command that ended the loop.
    pub fn run(&mut self) -> u16 {
        tracing::info!("program started");
        let result = self.tree.execute(self.root);
        tracing::info!(result, "program finished");
        result
    }
}

#[cfg(test)]
#[path = "../../tests/unit/app/program.rs"]
mod tests;
