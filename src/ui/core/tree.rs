//! The view arena.
//!
//! Every view lives in one `SlotMap` and is addressed by a [`ViewId`]. A node
//! carries the state every view shares (geometry, flags, owner link); groups
//! additionally carry [`GroupData`] with their z-ordered child list. Children
//! are stored front to back: index 0 is drawn on top and sees positional
//! events first.

use super::draw_buffer::{Attr, Cell, ColorPair};
use super::flags::{DragMode, EventMask, GrowMode, Options, StateFlags};
use super::geom::{Point, Rect};
use super::palette::{self, Palette};
use super::widget::Widget;
use crate::core::command::CommandSet;
use crate::core::error::{Result, ViewError};
use crate::core::event::{Event, MouseEvent};
use crate::ui::backend::{Backend, EventSource};
use slotmap::{new_key_type, SlotMap};
use std::collections::VecDeque;

new_key_type! {
    pub struct ViewId;
}

pub const HC_NO_CONTEXT: u16 = 0;
pub const HC_DRAGGING: u16 = 1;

/// Which pass of focused-event routing a group is in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Focused,
    PreProcess,
    PostProcess,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectMode {
    Normal,
    /// Entering a modal view: the previous current keeps SELECTED.
    Enter,
    /// Leaving a modal view: the restored current is not re-selected.
    Leave,
}

#[derive(Debug, Default)]
pub(super) struct GroupData {
    pub(super) children: Vec<ViewId>,
    pub(super) current: Option<ViewId>,
    pub(super) phase: Phase,
    pub(super) buffer: Option<Vec<Cell>>,
    pub(super) lock: u8,
    /// Writable area in local coordinates; narrowed while redrawing under a
    /// view.
    pub(super) clip: Rect,
}

pub(super) struct ViewNode {
    pub(super) origin: Point,
    pub(super) size: Point,
    pub(super) cursor: Point,
    pub(super) state: StateFlags,
    pub(super) options: Options,
    pub(super) event_mask: EventMask,
    pub(super) grow_mode: GrowMode,
    pub(super) drag_mode: DragMode,
    pub(super) help_ctx: u16,
    pub(super) min_size: Point,
    pub(super) palette: Palette,
    pub(super) owner: Option<ViewId>,
    pub(super) group: Option<GroupData>,
    pub(super) widget: Option<Box<dyn Widget>>,
    pub(super) end_state: u16,
    pub(super) redraws: u64,
    pub(super) active_follows_selection: bool,
}

impl ViewNode {
    fn bounds(&self) -> Rect {
        Rect::with_size(self.origin, self.size)
    }
}

pub struct ViewTree {
    pub(super) nodes: SlotMap<ViewId, ViewNode>,
    pub(super) root: Option<ViewId>,
    pub(super) commands: CommandSet,
    pub(super) command_set_changed: bool,
    pub(super) pending: Option<Event>,
    pub(super) queue: VecDeque<Event>,
    pub(super) source: Option<Box<dyn EventSource>>,
    pub(super) backend: Option<Box<dyn Backend>>,
    /// Root-local area written since the last flush.
    pub(super) damage: Rect,
    pub(super) deferred_draw: Vec<ViewId>,
    pub(super) deferred_exec: Vec<ViewId>,
    pub(super) deferred_drag: Vec<(ViewId, MouseEvent, DragMode)>,
    pub(super) top_view: Option<ViewId>,
    pub(super) status_line: Option<ViewId>,
    pub(super) cleared_by: Option<ViewId>,
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ViewTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewTree")
            .field("views", &self.nodes.len())
            .field("root", &self.root)
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl ViewTree {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            commands: CommandSet::all(),
            command_set_changed: false,
            pending: None,
            queue: VecDeque::new(),
            source: None,
            backend: None,
            damage: Rect::default(),
            deferred_draw: Vec::new(),
            deferred_exec: Vec::new(),
            deferred_drag: Vec::new(),
            top_view: None,
            status_line: None,
            cleared_by: None,
        }
    }

    /// Create a detached leaf view. It becomes live once inserted into a group.
    pub fn create(&mut self, bounds: Rect, widget: Box<dyn Widget>) -> ViewId {
        let mask = EventMask::MOUSE_DOWN | EventMask::KEY_DOWN | EventMask::COMMAND;
        self.create_node(bounds, widget, Options::NONE, mask, None)
    }

    /// Create a detached, buffered, selectable group.
    pub fn create_group(&mut self, bounds: Rect, widget: Box<dyn Widget>) -> ViewId {
        let group = GroupData {
            clip: Rect::with_size(Point::default(), bounds.size()),
            ..GroupData::default()
        };
        self.create_node(
            bounds,
            widget,
            Options::SELECTABLE | Options::BUFFERED,
            EventMask::ALL,
            Some(group),
        )
    }

    fn create_node(
        &mut self,
        bounds: Rect,
        widget: Box<dyn Widget>,
        options: Options,
        event_mask: EventMask,
        group: Option<GroupData>,
    ) -> ViewId {
        let palette = widget.palette();
        self.nodes.insert(ViewNode {
            origin: bounds.a,
            size: bounds.size(),
            cursor: Point::default(),
            state: StateFlags::VISIBLE,
            options,
            event_mask,
            grow_mode: GrowMode::NONE,
            drag_mode: DragMode::LIMIT_LO_Y,
            help_ctx: HC_NO_CONTEXT,
            min_size: Point::default(),
            palette,
            owner: None,
            group,
            widget: Some(widget),
            end_state: 0,
            redraws: 0,
            active_follows_selection: false,
        })
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.nodes.contains_key(id)
    }

    pub(super) fn node(&self, id: ViewId) -> Option<&ViewNode> {
        self.nodes.get(id)
    }

    pub(super) fn node_mut(&mut self, id: ViewId) -> Option<&mut ViewNode> {
        self.nodes.get_mut(id)
    }

    pub(super) fn group(&self, id: ViewId) -> Option<&GroupData> {
        self.nodes.get(id)?.group.as_ref()
    }

    pub(super) fn group_mut(&mut self, id: ViewId) -> Option<&mut GroupData> {
        self.nodes.get_mut(id)?.group.as_mut()
    }

    pub fn is_group(&self, id: ViewId) -> bool {
        self.group(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<ViewId> {
        self.root
    }

    pub fn owner(&self, id: ViewId) -> Option<ViewId> {
        self.node(id)?.owner
    }

    /// Children front to back. Empty for leaves and unknown ids.
    pub fn children(&self, id: ViewId) -> &[ViewId] {
        self.group(id).map(|g| g.children.as_slice()).unwrap_or(&[])
    }

    pub fn current(&self, id: ViewId) -> Option<ViewId> {
        self.group(id)?.current
    }

    pub fn phase(&self, id: ViewId) -> Phase {
        self.group(id).map(|g| g.phase).unwrap_or_default()
    }

    pub fn origin(&self, id: ViewId) -> Point {
        self.node(id).map(|n| n.origin).unwrap_or_default()
    }

    pub fn size(&self, id: ViewId) -> Point {
        self.node(id).map(|n| n.size).unwrap_or_default()
    }

    /// Bounds in the owner's coordinates.
    pub fn bounds(&self, id: ViewId) -> Rect {
        self.node(id).map(ViewNode::bounds).unwrap_or_default()
    }

    pub fn extent(&self, id: ViewId) -> Rect {
        Rect::with_size(Point::default(), self.size(id))
    }

    pub fn state(&self, id: ViewId) -> StateFlags {
        self.node(id).map(|n| n.state).unwrap_or_default()
    }

    pub fn options(&self, id: ViewId) -> Options {
        self.node(id).map(|n| n.options).unwrap_or_default()
    }

    pub fn set_options(&mut self, id: ViewId, options: Options) {
        if let Some(node) = self.node_mut(id) {
            node.options = options;
        }
    }

    pub fn event_mask(&self, id: ViewId) -> EventMask {
        self.node(id).map(|n| n.event_mask).unwrap_or_default()
    }

    pub fn set_event_mask(&mut self, id: ViewId, mask: EventMask) {
        if let Some(node) = self.node_mut(id) {
            node.event_mask = mask;
        }
    }

    pub fn grow_mode(&self, id: ViewId) -> GrowMode {
        self.node(id).map(|n| n.grow_mode).unwrap_or_default()
    }

    pub fn set_grow_mode(&mut self, id: ViewId, mode: GrowMode) {
        if let Some(node) = self.node_mut(id) {
            node.grow_mode = mode;
        }
    }

    pub fn drag_mode(&self, id: ViewId) -> DragMode {
        self.node(id).map(|n| n.drag_mode).unwrap_or_default()
    }

    pub fn set_drag_mode(&mut self, id: ViewId, mode: DragMode) {
        if let Some(node) = self.node_mut(id) {
            node.drag_mode = mode;
        }
    }

    pub fn set_help_ctx(&mut self, id: ViewId, help_ctx: u16) {
        if let Some(node) = self.node_mut(id) {
            node.help_ctx = help_ctx;
        }
    }

    pub fn min_size(&self, id: ViewId) -> Point {
        self.node(id).map(|n| n.min_size).unwrap_or_default()
    }

    pub fn set_min_size(&mut self, id: ViewId, min: Point) {
        if let Some(node) = self.node_mut(id) {
            node.min_size = min;
        }
    }

    pub fn palette(&self, id: ViewId) -> Palette {
        self.node(id).map(|n| n.palette).unwrap_or_default()
    }

    pub fn set_palette(&mut self, id: ViewId, palette: Palette) {
        if let Some(node) = self.node_mut(id) {
            node.palette = palette;
        }
        self.draw_view(id);
    }

    pub fn cursor(&self, id: ViewId) -> Point {
        self.node(id).map(|n| n.cursor).unwrap_or_default()
    }

    pub fn set_cursor(&mut self, id: ViewId, x: i16, y: i16) {
        if let Some(node) = self.node_mut(id) {
            node.cursor = Point::new(x, y);
        }
    }

    /// How many times a redraw of `id` has been requested.
    pub fn redraw_count(&self, id: ViewId) -> u64 {
        self.node(id).map(|n| n.redraws).unwrap_or(0)
    }

    /// The group's offscreen buffer, row major, if materialized.
    pub fn buffer(&self, id: ViewId) -> Option<&[Cell]> {
        self.group(id)?.buffer.as_deref()
    }

    /// Make SELECTED drive ACTIVE on this view (windows).
    pub fn set_active_follows_selection(&mut self, id: ViewId, enable: bool) {
        if let Some(node) = self.node_mut(id) {
            node.active_follows_selection = enable;
        }
    }

    pub fn active_follows_selection(&self, id: ViewId) -> bool {
        self.node(id).is_some_and(|n| n.active_follows_selection)
    }

    /// The help id stored on the node itself.
    pub fn own_help_ctx(&self, id: ViewId) -> u16 {
        self.node(id).map(|n| n.help_ctx).unwrap_or(HC_NO_CONTEXT)
    }

    pub(crate) fn restore_state(&mut self, id: ViewId, state: StateFlags) {
        if let Some(node) = self.node_mut(id) {
            node.state = state;
        }
    }

    /// Link `child` behind the existing children without showing it.
    pub(crate) fn attach_raw(&mut self, group: ViewId, child: ViewId) {
        if let Some(g) = self.group_mut(group) {
            g.children.push(child);
        }
        if let Some(node) = self.node_mut(child) {
            node.owner = Some(group);
        }
    }

    pub(crate) fn restore_current(&mut self, group: ViewId, current: Option<ViewId>) {
        if let Some(g) = self.group_mut(group) {
            g.current = current;
        }
    }

    pub fn widget_dyn(&self, id: ViewId) -> Option<&dyn Widget> {
        self.node(id)?.widget.as_deref()
    }

    pub fn widget<T: Widget>(&self, id: ViewId) -> Option<&T> {
        let widget: &dyn Widget = self.node(id)?.widget.as_deref()?;
        widget.as_any().downcast_ref::<T>()
    }

    pub fn widget_mut<T: Widget>(&mut self, id: ViewId) -> Option<&mut T> {
        let widget: &mut dyn Widget = self.node_mut(id)?.widget.as_deref_mut()?;
        widget.as_any_mut().downcast_mut::<T>()
    }

    /// Run `f` with the widget detached from its node. Returns `None` when
    /// the view is gone or its widget is already in use further up the stack.
    pub fn with_widget<R>(
        &mut self,
        id: ViewId,
        f: impl FnOnce(&mut dyn Widget, &mut ViewTree) -> R,
    ) -> Option<R> {
        let mut widget = self.take_widget(id)?;
        let result = f(widget.as_mut(), self);
        self.restore_widget(id, widget);
        Some(result)
    }

    pub(super) fn take_widget(&mut self, id: ViewId) -> Option<Box<dyn Widget>> {
        self.node_mut(id)?.widget.take()
    }

    /// Put a widget back and run whatever was queued for it while it was out.
    /// A view destroyed in the meantime simply drops its widget.
    pub(super) fn restore_widget(&mut self, id: ViewId, widget: Box<dyn Widget>) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        node.widget = Some(widget);
        if let Some(pos) = self.deferred_draw.iter().position(|&d| d == id) {
            self.deferred_draw.swap_remove(pos);
            self.draw_now(id);
        }
        if let Some(pos) = self.deferred_exec.iter().position(|&d| d == id) {
            self.deferred_exec.remove(pos);
            self.exec_and_post(id);
        }
        if let Some(pos) = self.deferred_drag.iter().position(|d| d.0 == id) {
            let (_, start, mode) = self.deferred_drag.remove(pos);
            self.run_drag(id, start, mode);
        }
    }

    pub fn make_global(&self, id: ViewId, local: Point) -> Point {
        let mut p = local;
        let mut cur = Some(id);
        while let Some(v) = cur {
            let Some(node) = self.node(v) else { break };
            if node.owner.is_some() {
                p += node.origin;
            }
            cur = node.owner;
        }
        p
    }

    pub fn make_local(&self, id: ViewId, global: Point) -> Point {
        global - self.make_global(id, Point::default())
    }

    pub fn is_member(&self, group: ViewId, view: ViewId) -> bool {
        self.owner(view) == Some(group) && self.children(group).contains(&view)
    }

    pub fn index_of(&self, group: ViewId, view: ViewId) -> Option<usize> {
        self.children(group).iter().position(|&c| c == view)
    }

    /// The child directly behind `id`.
    pub fn next_view(&self, id: ViewId) -> Option<ViewId> {
        let owner = self.owner(id)?;
        let children = self.children(owner);
        let i = children.iter().position(|&c| c == id)?;
        children.get(i + 1).copied()
    }

    pub fn prev_view(&self, id: ViewId) -> Option<ViewId> {
        let owner = self.owner(id)?;
        let children = self.children(owner);
        let i = children.iter().position(|&c| c == id)?;
        i.checked_sub(1).map(|j| children[j])
    }

    /// Front-most visible child containing `local` (group coordinates).
    pub fn child_at(&self, group: ViewId, local: Point) -> Option<ViewId> {
        self.children(group).iter().copied().find(|&c| {
            self.node(c)
                .is_some_and(|n| n.state.contains(StateFlags::VISIBLE) && n.bounds().contains(local))
        })
    }

    /// First child, front to back, carrying all of `state` and `options`.
    pub fn first_match(&self, group: ViewId, state: StateFlags, options: Options) -> Option<ViewId> {
        self.children(group).iter().copied().find(|&c| {
            self.node(c)
                .is_some_and(|n| n.state.contains(state) && n.options.contains(options))
        })
    }

    /// Visit the children of `group` front to back. The list is snapshotted
    /// first; views removed by an earlier visit are skipped.
    pub fn for_each_child(&mut self, group: ViewId, mut f: impl FnMut(&mut ViewTree, ViewId)) {
        let snapshot = self.children(group).to_vec();
        for child in snapshot {
            if self.is_member(group, child) {
                f(self, child);
            }
        }
    }

    pub fn map_color(&self, id: ViewId, index: u8) -> Attr {
        let chain = std::iter::successors(Some(id), |&v| self.owner(v)).map(|v| self.palette(v));
        palette::resolve_chain(chain, index)
    }

    pub fn get_color(&self, id: ViewId, pair: u16) -> ColorPair {
        let [lo, hi] = pair.to_le_bytes();
        let normal = self.map_color(id, lo);
        let highlight = if hi == 0 { normal } else { self.map_color(id, hi) };
        ColorPair { normal, highlight }
    }

    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    pub fn command_enabled(&self, command: u16) -> bool {
        self.commands.has(command)
    }

    pub fn enable_command(&mut self, command: u16) {
        if self.commands.enable(command) {
            self.command_set_changed = true;
        }
    }

    pub fn disable_command(&mut self, command: u16) {
        if self.commands.disable(command) {
            self.command_set_changed = true;
        }
    }

    pub fn set_commands(&mut self, commands: CommandSet) {
        if self.commands != commands {
            self.commands = commands;
            self.command_set_changed = true;
        }
    }

    /// Insert `view` in front of every other child.
    pub fn insert(&mut self, group: ViewId, view: ViewId) -> Result<()> {
        let first = self.children(group).first().copied();
        self.insert_before(group, view, first)
    }

    /// Insert `view` directly in front of `target`, or behind every child when
    /// `target` is `None`. A visible view is shown (exposed and drawn).
    pub fn insert_before(&mut self, group: ViewId, view: ViewId, target: Option<ViewId>) -> Result<()> {
        if !self.contains(view) {
            return Err(ViewError::UnknownView(view));
        }
        if !self.is_group(group) {
            return Err(ViewError::NotAGroup(group));
        }
        if self.owner(view).is_some() || self.root == Some(view) || view == group {
            return Err(ViewError::AlreadyOwned(view));
        }
        if let Some(target) = target {
            if !self.is_member(group, target) {
                return Err(ViewError::NotAMember { group, view: target });
            }
        }

        let owner_size = self.size(group);
        let Some(node) = self.node_mut(view) else {
            return Err(ViewError::UnknownView(view));
        };
        if node.options.contains(Options::CENTER_X) {
            node.origin.x = (owner_size.x - node.size.x) / 2;
        }
        if node.options.contains(Options::CENTER_Y) {
            node.origin.y = (owner_size.y - node.size.y) / 2;
        }
        let saved = node.state;
        node.state.set(StateFlags::VISIBLE, false);
        node.owner = Some(group);

        if let Some(g) = self.group_mut(group) {
            let pos = target
                .and_then(|t| g.children.iter().position(|&c| c == t))
                .unwrap_or(g.children.len());
            g.children.insert(pos, view);
        }
        tracing::debug!(?view, ?group, "view inserted");

        if saved.contains(StateFlags::VISIBLE) {
            self.apply_state(view, StateFlags::VISIBLE, true);
        }
        Ok(())
    }

    /// Unlink `view` from `group`. The view is hidden first, so whatever it
    /// covered is redrawn, and keeps its VISIBLE flag for a later insert.
    pub fn remove(&mut self, group: ViewId, view: ViewId) -> Result<()> {
        if !self.is_member(group, view) {
            return Err(ViewError::NotAMember { group, view });
        }
        let saved = self.state(view);
        if saved.contains(StateFlags::VISIBLE) {
            self.apply_state(view, StateFlags::VISIBLE, false);
        }
        if self.current(group) == Some(view) {
            if self.state(view).contains(StateFlags::FOCUSED) {
                self.apply_state(view, StateFlags::FOCUSED, false);
            }
            if let Some(node) = self.node_mut(view) {
                node.state.set(StateFlags::SELECTED, false);
            }
            if let Some(g) = self.group_mut(group) {
                g.current = None;
            }
        }
        if let Some(g) = self.group_mut(group) {
            g.children.retain(|&c| c != view);
        }
        if let Some(node) = self.node_mut(view) {
            node.owner = None;
            if saved.contains(StateFlags::VISIBLE) {
                node.state.set(StateFlags::VISIBLE, true);
            }
        }
        tracing::debug!(?view, ?group, "view removed");
        Ok(())
    }

    /// Remove `id` from its owner and free it with its whole subtree.
    pub fn destroy(&mut self, id: ViewId) {
        if !self.contains(id) {
            return;
        }
        if let Some(owner) = self.owner(id) {
            let _ = self.remove(owner, id);
        }
        let mut stack = vec![id];
        let mut freed = 0usize;
        while let Some(v) = stack.pop() {
            if let Some(node) = self.nodes.remove(v) {
                if let Some(group) = node.group {
                    stack.extend(group.children);
                }
                freed += 1;
            }
            self.deferred_draw.retain(|&d| d != v);
            self.deferred_exec.retain(|&d| d != v);
            self.deferred_drag.retain(|d| d.0 != v);
            for slot in [&mut self.root, &mut self.top_view, &mut self.status_line] {
                if *slot == Some(v) {
                    *slot = None;
                }
            }
        }
        tracing::debug!(?id, freed, "view destroyed");
    }

    /// Make `id` the screen root: visible, focused, modal and exposed. The
    /// root is drawn once so its buffer mirrors the screen.
    pub fn set_root(&mut self, id: ViewId) -> Result<()> {
        if !self.is_group(id) {
            return Err(ViewError::NotAGroup(id));
        }
        if self.owner(id).is_some() {
            return Err(ViewError::AlreadyOwned(id));
        }
        self.root = Some(id);
        if let Some(node) = self.node_mut(id) {
            node.state |= StateFlags::VISIBLE
                | StateFlags::SELECTED
                | StateFlags::FOCUSED
                | StateFlags::MODAL;
            node.options |= Options::BUFFERED;
        }
        self.apply_state(id, StateFlags::EXPOSED, true);
        self.damage = self.extent(id);
        self.draw_view(id);
        Ok(())
    }

    pub fn status_line(&self) -> Option<ViewId> {
        self.status_line
    }

    /// Register the view that preprocesses keys and idles with the loop.
    pub fn set_status_line(&mut self, id: Option<ViewId>) {
        self.status_line = id;
    }

    /// The innermost modal view, or the root outside any modal loop.
    pub fn top_view(&self) -> Option<ViewId> {
        self.top_view.or(self.root)
    }

    /// Effective help context: dragging wins, then the widget, then the
    /// current child, then the view's own id.
    pub fn help_ctx(&self, id: ViewId) -> u16 {
        let Some(node) = self.node(id) else {
            return HC_NO_CONTEXT;
        };
        if node.state.contains(StateFlags::DRAGGING) {
            return HC_DRAGGING;
        }
        if let Some(ctx) = node.widget.as_ref().and_then(|w| w.help_ctx(self, id)) {
            return ctx;
        }
        if let Some(current) = node.group.as_ref().and_then(|g| g.current) {
            let ctx = self.help_ctx(current);
            if ctx != HC_NO_CONTEXT {
                return ctx;
            }
        }
        node.help_ctx
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/ui/core/tree.rs"]
mod tests;
