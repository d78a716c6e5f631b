//! Drawing, exposure and geometry changes.
//!
//! A view writes rows in its own coordinates. Each row span travels up the
//! owner chain: it is clipped to the owner's clip rect, cut around visible
//! siblings in front of the writer, copied into the owner's buffer when one
//! exists, and forwarded further unless the owner is locked. Spans that reach
//! the root are accumulated as damage and committed by [`ViewTree::flush`].

use super::draw_buffer::Cell;
use super::flags::{DragMode, GrowMode, Options, StateFlags};
use super::geom::{Point, Rect};
use super::tree::{SelectMode, ViewId, ViewTree};
use super::widget::{DrawCx, Widget};
use crate::core::command::{CM_RECEIVED_FOCUS, CM_RELEASED_FOCUS};
use crate::core::error::{Result, ViewError};
use crate::core::event::{Event, Info};

type Span = (i16, i16);

impl ViewTree {
    /// Set or clear exactly one state flag and run its side effects.
    pub fn set_state(&mut self, id: ViewId, flag: StateFlags, enable: bool) -> Result<()> {
        let bits = flag.bits();
        if bits.count_ones() != 1 {
            return Err(ViewError::MultipleStateBits(bits));
        }
        if !self.contains(id) {
            return Err(ViewError::UnknownView(id));
        }
        if flag == StateFlags::FOCUSED && enable {
            if let Some(owner) = self.owner(id) {
                if self.current(owner) != Some(id) {
                    self.set_current(owner, Some(id), SelectMode::Normal);
                }
                let stray: Vec<ViewId> = self
                    .children(owner)
                    .iter()
                    .copied()
                    .filter(|&c| c != id && self.state(c).contains(StateFlags::FOCUSED))
                    .collect();
                for other in stray {
                    self.apply_state(other, StateFlags::FOCUSED, false);
                    self.draw_view(other);
                }
            }
            if self.state(id).contains(StateFlags::FOCUSED) {
                return Ok(());
            }
        }
        self.apply_state(id, flag, enable);
        Ok(())
    }

    pub(super) fn apply_state(&mut self, id: ViewId, flag: StateFlags, enable: bool) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        node.state.set(flag, enable);
        let owner = node.owner;
        let selectable = node.options.contains(Options::SELECTABLE);
        let follows = node.active_follows_selection;
        let is_group = node.group.is_some();

        if let Some(owner) = owner {
            if flag == StateFlags::VISIBLE {
                if self.state(owner).contains(StateFlags::EXPOSED) {
                    self.apply_state(id, StateFlags::EXPOSED, enable);
                }
                if enable {
                    self.draw_view(id);
                } else {
                    self.draw_under_view(id);
                }
                if selectable {
                    self.reset_current(owner);
                }
            } else if flag == StateFlags::FOCUSED {
                let command = if enable { CM_RECEIVED_FOCUS } else { CM_RELEASED_FOCUS };
                self.message(owner, Event::broadcast(command, Info::View(id)));
            }
        }

        if is_group {
            if flag == StateFlags::ACTIVE || flag == StateFlags::DRAGGING {
                self.for_each_child(id, |tree, child| tree.apply_state(child, flag, enable));
                self.draw_view(id);
            } else if flag == StateFlags::FOCUSED {
                if let Some(current) = self.current(id) {
                    self.apply_state(current, StateFlags::FOCUSED, enable);
                }
            } else if flag == StateFlags::EXPOSED {
                self.for_each_child(id, |tree, child| {
                    if tree.state(child).contains(StateFlags::VISIBLE) {
                        tree.apply_state(child, StateFlags::EXPOSED, enable);
                    }
                });
                if !enable {
                    self.free_buffer(id);
                }
            }
        }

        if flag == StateFlags::SELECTED && follows {
            self.apply_state(id, StateFlags::ACTIVE, enable);
        }
    }

    pub fn show(&mut self, id: ViewId) {
        if !self.state(id).contains(StateFlags::VISIBLE) {
            self.apply_state(id, StateFlags::VISIBLE, true);
        }
    }

    pub fn hide(&mut self, id: ViewId) {
        if self.state(id).contains(StateFlags::VISIBLE) {
            self.apply_state(id, StateFlags::VISIBLE, false);
        }
    }

    /// Request a repaint of `id`. Views that cannot reach the screen are
    /// skipped; a view whose widget is busy is repainted once it returns.
    pub fn draw_view(&mut self, id: ViewId) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        node.redraws += 1;
        self.draw_now(id);
    }

    /// Repaint `id` using a widget the caller currently holds.
    pub fn draw_self(&mut self, id: ViewId, widget: &dyn Widget) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        node.redraws += 1;
        self.deferred_draw.retain(|&d| d != id);
        if self.exposed(id) {
            widget.draw(&mut DrawCx::new(self, id));
        }
    }

    pub(super) fn draw_now(&mut self, id: ViewId) {
        if !self.exposed(id) {
            return;
        }
        match self.take_widget(id) {
            Some(widget) => {
                widget.draw(&mut DrawCx::new(self, id));
                self.restore_widget(id, widget);
            }
            None => {
                if self.contains(id) && !self.deferred_draw.contains(&id) {
                    self.deferred_draw.push(id);
                }
            }
        }
    }

    pub(super) fn draw_group(&mut self, id: ViewId) {
        self.get_buffer(id);
        if self.buffer(id).is_some() {
            if let Some(group) = self.group_mut(id) {
                group.lock += 1;
            }
            self.redraw_children(id);
            if let Some(group) = self.group_mut(id) {
                group.lock = group.lock.saturating_sub(1);
            }
            let size = self.size(id);
            let cells = self.buffer(id).map(<[Cell]>::to_vec).unwrap_or_default();
            self.write_rows(id, 0, 0, size.x, size.y, &cells);
        } else {
            let clip = self.clip_rect(id);
            let extent = self.extent(id);
            if let Some(group) = self.group_mut(id) {
                group.clip = clip;
            }
            self.redraw_children(id);
            if let Some(group) = self.group_mut(id) {
                group.clip = extent;
            }
        }
    }

    fn redraw_children(&mut self, id: ViewId) {
        let snapshot = self.children(id).to_vec();
        for child in snapshot.into_iter().rev() {
            if self.is_member(id, child) {
                self.draw_now(child);
            }
        }
    }

    /// Part of the group inside its owner's clip, in local coordinates.
    fn clip_rect(&self, id: ViewId) -> Rect {
        let Some(owner) = self.owner(id).and_then(|o| self.group(o)) else {
            return self.extent(id);
        };
        let bounds = self.bounds(id);
        bounds.intersect(owner.clip).moved(-bounds.a.x, -bounds.a.y)
    }

    /// Redraw the views behind `id` over the area it covers.
    pub(super) fn draw_under_view(&mut self, id: ViewId) {
        let Some(owner) = self.owner(id) else {
            return;
        };
        let rect = self.bounds(id);
        self.redraw_under(owner, rect, Some(id));
    }

    /// Redraw the children of `owner` behind `after` (all children when
    /// `None`), restricted to `rect` in owner coordinates.
    pub(super) fn redraw_under(&mut self, owner: ViewId, rect: Rect, after: Option<ViewId>) {
        let Some(group) = self.group_mut(owner) else {
            return;
        };
        let saved = group.clip;
        group.clip = saved.intersect(rect);
        if !group.clip.is_empty() {
            let children = self.children(owner).to_vec();
            let start = after
                .and_then(|a| children.iter().position(|&c| c == a))
                .map_or(0, |p| p + 1);
            for &child in children[start..].iter().rev() {
                if self.is_member(owner, child) {
                    self.draw_now(child);
                }
            }
        }
        if let Some(group) = self.group_mut(owner) {
            group.clip = saved;
        }
    }

    /// True when at least one cell of `id` would reach the screen.
    pub fn exposed(&self, id: ViewId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        if !node.state.contains(StateFlags::EXPOSED) || node.size.x <= 0 || node.size.y <= 0 {
            return false;
        }
        (0..node.size.y).any(|y| self.row_reaches_root(id, y, 0, node.size.x))
    }

    fn row_reaches_root(&self, id: ViewId, y: i16, x0: i16, x1: i16) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        let Some(owner) = node.owner else {
            return self.root == Some(id);
        };
        let Some(group) = self.group(owner) else {
            return false;
        };
        let y = y + node.origin.y;
        let clip = group.clip;
        if y < clip.a.y || y >= clip.b.y {
            return false;
        }
        let x0 = (x0 + node.origin.x).max(clip.a.x);
        let x1 = (x1 + node.origin.x).min(clip.b.x);
        if x0 >= x1 {
            return false;
        }
        self.visible_spans(owner, id, y, x0, x1)
            .into_iter()
            .any(|(a, b)| self.row_reaches_root(owner, y, a, b))
    }

    /// Cut `[x0, x1)` on row `y` of `owner` around the visible siblings in
    /// front of `child`.
    fn visible_spans(&self, owner: ViewId, child: ViewId, y: i16, x0: i16, x1: i16) -> Vec<Span> {
        let mut spans = vec![(x0, x1)];
        for &sibling in self.children(owner) {
            if sibling == child || spans.is_empty() {
                break;
            }
            let Some(node) = self.node(sibling) else {
                continue;
            };
            if !node.state.contains(StateFlags::VISIBLE) {
                continue;
            }
            let r = Rect::with_size(node.origin, node.size);
            if y < r.a.y || y >= r.b.y {
                continue;
            }
            spans = spans
                .into_iter()
                .flat_map(|(a, b)| {
                    let left = (a, b.min(r.a.x));
                    let right = (a.max(r.b.x), b);
                    [left, right].into_iter().filter(|(l, r)| l < r)
                })
                .collect();
        }
        spans
    }

    pub(super) fn write_rows(&mut self, id: ViewId, x: i16, y: i16, w: i16, h: i16, cells: &[Cell]) {
        if w <= 0 || h <= 0 {
            return;
        }
        let stride = w as usize;
        for row in 0..h {
            let start = row as usize * stride;
            let Some(line) = cells.get(start..start + stride) else {
                break;
            };
            self.write_row(id, y + row, x, x + w, line, x);
        }
    }

    /// Write `src` to row `y` of `id`; `src[0]` lands on column `src_x`.
    pub(super) fn write_row(&mut self, id: ViewId, y: i16, x0: i16, x1: i16, src: &[Cell], src_x: i16) {
        let Some(node) = self.node(id) else {
            return;
        };
        if !node.state.contains(StateFlags::VISIBLE) || y < 0 || y >= node.size.y {
            return;
        }
        let end = src_x.saturating_add(src.len().min(i16::MAX as usize) as i16);
        let x0 = x0.max(0).max(src_x);
        let x1 = x1.min(node.size.x).min(end);
        if x0 >= x1 {
            return;
        }
        self.write_up(id, y, x0, x1, src, src_x);
    }

    fn write_up(&mut self, id: ViewId, y: i16, x0: i16, x1: i16, src: &[Cell], src_x: i16) {
        let Some(node) = self.node(id) else {
            return;
        };
        let Some(owner) = node.owner else {
            if self.root == Some(id) {
                self.damage = self.damage.union(Rect::new(x0, y, x1, y + 1));
            }
            return;
        };
        let origin = node.origin;
        let (y, src_x) = (y + origin.y, src_x + origin.x);
        let Some(group) = self.group(owner) else {
            return;
        };
        let clip = group.clip;
        if y < clip.a.y || y >= clip.b.y {
            return;
        }
        let x0 = (x0 + origin.x).max(clip.a.x);
        let x1 = (x1 + origin.x).min(clip.b.x);
        if x0 >= x1 {
            return;
        }
        let spans = self.visible_spans(owner, id, y, x0, x1);
        if spans.is_empty() {
            return;
        }

        let Some(owner_node) = self.node_mut(owner) else {
            return;
        };
        let size = owner_node.size;
        let forward = owner_node.state.contains(StateFlags::EXPOSED | StateFlags::VISIBLE);
        let Some(group) = owner_node.group.as_mut() else {
            return;
        };
        let forward = forward && group.lock == 0;
        if let Some(buffer) = group.buffer.as_mut() {
            if y >= 0 && y < size.y {
                let row = y as usize * size.x as usize;
                for &(a, b) in &spans {
                    for x in a.max(0)..b.min(size.x) {
                        let (Some(dst), Some(cell)) =
                            (buffer.get_mut(row + x as usize), src.get((x - src_x) as usize))
                        else {
                            continue;
                        };
                        *dst = *cell;
                    }
                }
            }
        }
        if forward {
            for (a, b) in spans {
                self.write_up(owner, y, a, b, src, src_x);
            }
        }
    }

    pub(super) fn get_buffer(&mut self, id: ViewId) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let wants = node.state.contains(StateFlags::EXPOSED)
            && node.options.contains(Options::BUFFERED)
            && node.size.x > 0
            && node.size.y > 0;
        let len = node.size.x as usize * node.size.y as usize;
        if let Some(group) = node.group.as_mut() {
            if wants && group.buffer.is_none() {
                group.buffer = Some(vec![Cell::default(); len]);
            }
        }
    }

    pub(super) fn free_buffer(&mut self, id: ViewId) {
        if let Some(group) = self.group_mut(id) {
            group.buffer = None;
        }
    }

    /// Batch redraws of a buffered group until the matching [`unlock`].
    /// Returns whether the lock was taken.
    ///
    /// [`unlock`]: ViewTree::unlock
    pub fn lock(&mut self, id: ViewId) -> bool {
        match self.group_mut(id) {
            Some(group) if group.buffer.is_some() || group.lock > 0 => {
                group.lock += 1;
                true
            }
            _ => false,
        }
    }

    pub fn unlock(&mut self, id: ViewId) {
        let Some(group) = self.group_mut(id) else {
            return;
        };
        if group.lock == 0 {
            return;
        }
        group.lock -= 1;
        if group.lock == 0 {
            self.draw_view(id);
        }
    }

    /// Commit the damaged part of the root buffer to the backend.
    pub fn flush(&mut self) {
        let Some(root) = self.root else {
            return;
        };
        let damage = std::mem::take(&mut self.damage);
        let cursor = self.cursor_position();
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        if let Some(node) = self.nodes.get(root) {
            let extent = Rect::with_size(Point::default(), node.size);
            let area = damage.intersect(extent);
            let buffer = node.group.as_ref().and_then(|g| g.buffer.as_deref());
            if let (false, Some(buffer)) = (area.is_empty(), buffer) {
                let stride = node.size.x as usize;
                let mut cells = Vec::with_capacity(area.width() as usize * area.height() as usize);
                for y in area.a.y..area.b.y {
                    let row = y as usize * stride;
                    cells.extend_from_slice(&buffer[row + area.a.x as usize..row + area.b.x as usize]);
                }
                backend.commit(area.a.x, area.a.y, area.width() as u16, area.height() as u16, &cells);
            }
        }
        backend.set_cursor(cursor);
        if let Err(error) = backend.present() {
            tracing::warn!(%error, "present failed");
        }
    }

    /// Screen position of the focused view's cursor, if it shows one.
    pub fn cursor_position(&self) -> Option<Point> {
        let mut view = self.root?;
        while let Some(current) = self.current(view) {
            view = current;
        }
        let node = self.node(view)?;
        if !node.state.contains(StateFlags::CURSOR_VIS | StateFlags::FOCUSED) {
            return None;
        }
        if !Rect::with_size(Point::default(), node.size).contains(node.cursor) {
            return None;
        }
        Some(self.make_global(view, node.cursor))
    }

    /// Size bounds used by `locate`: the view's minimum and its owner's size.
    pub fn size_limits(&self, id: ViewId) -> (Point, Point) {
        let max = match self.owner(id) {
            Some(owner) => self.size(owner),
            None => Point::new(i16::MAX, i16::MAX),
        };
        (self.min_size(id), max)
    }

    /// Move and resize `id`, clamped to its size limits, then repaint what
    /// it uncovered.
    pub fn locate(&mut self, id: ViewId, bounds: Rect) {
        let (min, max) = self.size_limits(id);
        let clamp = |v: i16, lo: i16, hi: i16| v.max(lo).min(hi);
        let mut r = bounds;
        r.b.x = r.a.x + clamp(bounds.b.x - bounds.a.x, min.x, max.x);
        r.b.y = r.a.y + clamp(bounds.b.y - bounds.a.y, min.y, max.y);
        let old = self.bounds(id);
        if r == old {
            return;
        }
        self.change_bounds(id, r);
        if let Some(owner) = self.owner(id) {
            if self.state(id).contains(StateFlags::VISIBLE) {
                self.redraw_under(owner, old.union(r), Some(id));
            }
        }
    }

    pub fn move_to(&mut self, id: ViewId, x: i16, y: i16) {
        let size = self.size(id);
        self.locate(id, Rect::with_size(Point::new(x, y), size));
    }

    pub fn grow_to(&mut self, id: ViewId, w: i16, h: i16) {
        let origin = self.origin(id);
        self.locate(id, Rect::with_size(origin, Point::new(w, h)));
    }

    /// Apply new bounds without clamping. Groups re-lay out their children
    /// by grow mode.
    pub fn change_bounds(&mut self, id: ViewId, bounds: Rect) {
        let old = self.size(id);
        let delta = bounds.size() - old;
        if self.is_group(id) && delta != Point::default() {
            self.free_buffer(id);
            self.set_bounds(id, bounds);
            self.get_buffer(id);
            let locked = self.lock(id);
            self.for_each_child(id, |tree, child| {
                let r = tree.calc_bounds(child, delta);
                tree.change_bounds(child, r);
            });
            if locked {
                self.unlock(id);
            } else {
                self.draw_view(id);
            }
        } else {
            self.set_bounds(id, bounds);
            self.draw_view(id);
        }
    }

    fn set_bounds(&mut self, id: ViewId, bounds: Rect) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        node.origin = bounds.a;
        node.size = bounds.size();
        let extent = Rect::with_size(Point::default(), node.size);
        if let Some(group) = node.group.as_mut() {
            group.clip = extent;
        }
    }

    /// New bounds for `id` after its owner grew by `delta`.
    pub fn calc_bounds(&self, id: ViewId, delta: Point) -> Rect {
        let mut r = self.bounds(id);
        let mode = self.grow_mode(id);
        let owner_size = self.owner(id).map(|o| self.size(o)).unwrap_or_default();
        let rel = mode.contains(GrowMode::REL);
        let grow = |v: i16, s: i16, d: i16| -> i16 {
            if rel {
                let old = i32::from(s) - i32::from(d);
                if old == 0 {
                    v
                } else {
                    ((i32::from(v) * i32::from(s) + (old >> 1)) / old) as i16
                }
            } else {
                v + d
            }
        };
        if mode.contains(GrowMode::LO_X) {
            r.a.x = grow(r.a.x, owner_size.x, delta.x);
        }
        if mode.contains(GrowMode::HI_X) {
            r.b.x = grow(r.b.x, owner_size.x, delta.x);
        }
        if mode.contains(GrowMode::LO_Y) {
            r.a.y = grow(r.a.y, owner_size.y, delta.y);
        }
        if mode.contains(GrowMode::HI_Y) {
            r.b.y = grow(r.b.y, owner_size.y, delta.y);
        }
        let (min, max) = self.size_limits(id);
        r.b.x = r.a.x + (r.b.x - r.a.x).max(min.x).min(max.x);
        r.b.y = r.a.y + (r.b.y - r.a.y).max(min.y).min(max.y);
        r
    }

    /// Position `id` at `origin` with `size`, keeping it reachable inside
    /// `limits` (owner coordinates) as `mode` demands.
    pub(super) fn move_grow(
        &mut self,
        id: ViewId,
        origin: Point,
        size: Point,
        limits: Rect,
        min: Point,
        max: Point,
        mode: DragMode,
    ) {
        let size = Point::new(size.x.max(min.x).min(max.x), size.y.max(min.y).min(max.y));
        let mut p = origin;
        p.x = p.x.max(limits.a.x - size.x + 1).min(limits.b.x - 1);
        p.y = p.y.max(limits.a.y - size.y + 1).min(limits.b.y - 1);
        if mode.contains(DragMode::LIMIT_LO_X) {
            p.x = p.x.max(limits.a.x);
        }
        if mode.contains(DragMode::LIMIT_LO_Y) {
            p.y = p.y.max(limits.a.y);
        }
        if mode.contains(DragMode::LIMIT_HI_X) {
            p.x = p.x.min(limits.b.x - size.x);
        }
        if mode.contains(DragMode::LIMIT_HI_Y) {
            p.y = p.y.min(limits.b.y - size.y);
        }
        self.locate(id, Rect::with_size(p, size));
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/ui/core/redraw.rs"]
mod tests;
