//! Event routing and modal execution.
//!
//! Positional (mouse) events go to the front-most visible child under the
//! pointer. Focused (keyboard and command) events go through the
//! pre-process children, then the current child, then the post-process
//! children. Broadcasts reach every child regardless of event masks. A
//! handler marks an event consumed by clearing it.

use super::flags::{DragMode, EventMask, Options, StateFlags};
use super::geom::{Point, Rect};
use super::tree::{Phase, SelectMode, ViewId, ViewTree};
use crate::core::command::{CM_CANCEL, CM_COMMAND_SET_CHANGED};
use crate::core::event::{Event, Info, MouseEvent, MouseKind};
use crate::ui::backend::{Backend, EventSource};

impl ViewTree {
    pub fn set_event_source(&mut self, source: Box<dyn EventSource>) {
        self.source = Some(source);
    }

    pub fn set_backend(&mut self, backend: Box<dyn Backend>) {
        self.backend = Some(backend);
        if let Some(root) = self.root {
            self.damage = self.extent(root);
        }
    }

    pub fn backend(&self) -> Option<&dyn Backend> {
        self.backend.as_deref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut (dyn Backend + 'static)> {
        self.backend.as_deref_mut()
    }

    /// Downcast the installed backend.
    pub fn backend_as<T: Backend>(&self) -> Option<&T> {
        self.backend.as_deref()?.as_any().downcast_ref::<T>()
    }

    /// Deliver `ev` to the widget of `id`.
    pub fn handle_event(&mut self, id: ViewId, ev: &mut Event) {
        match self.take_widget(id) {
            Some(mut widget) => {
                widget.handle_event(self, id, ev);
                self.restore_widget(id, widget);
            }
            None if self.contains(id) => self.default_handle_event(id, ev),
            None => {}
        }
    }

    /// The stock behaviour: group routing for groups, click-to-select for
    /// leaves.
    pub fn default_handle_event(&mut self, id: ViewId, ev: &mut Event) {
        if self.is_group(id) {
            self.group_handle_event(id, ev);
        } else {
            self.view_handle_event(id, ev);
        }
    }

    /// Clicks outside the view are dropped; a click on an unselected,
    /// selectable view selects it and is consumed unless the view takes
    /// first clicks.
    pub fn view_handle_event(&mut self, id: ViewId, ev: &mut Event) {
        let Event::Mouse(mouse) = *ev else {
            return;
        };
        if mouse.kind != MouseKind::Down {
            return;
        }
        let local = self.make_local(id, mouse.pos);
        if !self.extent(id).contains(local) {
            self.clear_event(id, ev);
            return;
        }
        let state = self.state(id);
        let options = self.options(id);
        if !state.intersects(StateFlags::SELECTED | StateFlags::DISABLED)
            && options.contains(Options::SELECTABLE)
        {
            self.select(id);
            if !self.state(id).contains(StateFlags::SELECTED)
                || !options.contains(Options::FIRST_CLICK)
            {
                self.clear_event(id, ev);
            }
        }
    }

    pub fn group_handle_event(&mut self, id: ViewId, ev: &mut Event) {
        self.view_handle_event(id, ev);
        if ev.is_nothing() {
            return;
        }
        let mask = ev.mask();
        if mask.intersects(EventMask::FOCUSED) {
            self.set_phase(id, Phase::PreProcess);
            self.for_each_child(id, |tree, child| {
                if tree.options(child).contains(Options::PRE_PROCESS) {
                    tree.deliver(child, ev);
                }
            });
            self.set_phase(id, Phase::Focused);
            if let Some(current) = self.current(id) {
                self.deliver(current, ev);
            }
            self.set_phase(id, Phase::PostProcess);
            self.for_each_child(id, |tree, child| {
                if tree.options(child).contains(Options::POST_PROCESS) {
                    tree.deliver(child, ev);
                }
            });
        } else {
            self.set_phase(id, Phase::Focused);
            if mask.intersects(EventMask::POSITIONAL) {
                let Some(mouse) = ev.as_mouse() else {
                    return;
                };
                let local = self.make_local(id, mouse.pos);
                if let Some(child) = self.child_at(id, local) {
                    self.deliver(child, ev);
                }
            } else {
                self.for_each_child(id, |tree, child| tree.deliver(child, ev));
            }
        }
        self.set_phase(id, Phase::Focused);
    }

    fn set_phase(&mut self, id: ViewId, phase: Phase) {
        if let Some(group) = self.group_mut(id) {
            group.phase = phase;
        }
    }

    fn deliver(&mut self, child: ViewId, ev: &mut Event) {
        if ev.is_nothing() {
            return;
        }
        let Some(node) = self.node(child) else {
            return;
        };
        let mask = ev.mask();
        if node.state.contains(StateFlags::DISABLED)
            && mask.intersects(EventMask::POSITIONAL | EventMask::FOCUSED)
        {
            return;
        }
        if !matches!(ev, Event::Broadcast(_)) && !node.event_mask.intersects(mask) {
            return;
        }
        self.handle_event(child, ev);
    }

    /// Mark `ev` as consumed by `id`.
    pub fn clear_event(&mut self, id: ViewId, ev: &mut Event) {
        ev.clear();
        self.cleared_by = Some(id);
    }

    /// Send `ev` synchronously to `receiver`. Returns the view that consumed
    /// it, if any.
    pub fn message(&mut self, receiver: ViewId, ev: Event) -> Option<ViewId> {
        if !self.contains(receiver) {
            return None;
        }
        let saved = self.cleared_by.take();
        let mut ev = ev;
        self.handle_event(receiver, &mut ev);
        let consumer = self.cleared_by.take();
        self.cleared_by = saved;
        ev.is_nothing().then(|| consumer.unwrap_or(receiver))
    }

    /// Re-inject one event; it is returned by the next `get_event`.
    pub fn put_event(&mut self, ev: Event) {
        self.pending = Some(ev);
    }

    /// Queue an event behind everything already waiting.
    pub fn post_event(&mut self, ev: Event) {
        self.queue.push_back(ev);
    }

    /// True when no event can arrive any more: nothing pending or queued and
    /// the source (if any) is closed.
    pub fn input_exhausted(&self) -> bool {
        self.pending.is_none()
            && self.queue.is_empty()
            && self.source.as_ref().map_or(true, |s| s.is_closed())
    }

    /// Next event for a modal loop. Disabled commands are dropped, the status
    /// line sees keys and clicks on itself first, and an empty poll idles.
    pub fn get_event(&mut self) -> Event {
        let mut ev = if let Some(ev) = self.pending.take() {
            ev
        } else if let Some(ev) = self.queue.pop_front() {
            ev
        } else if let Some(source) = self.source.as_mut() {
            source.poll_event().unwrap_or_default()
        } else {
            Event::Nothing
        };

        if let Event::Command(message) = ev {
            if !self.commands.has(message.command) {
                tracing::debug!(command = message.command, "dropping disabled command");
                ev = Event::Nothing;
            }
        }

        if ev.is_nothing() {
            self.idle();
            return ev;
        }

        if let Some(status) = self.status_line {
            let wants = match ev {
                Event::KeyDown(_) => true,
                Event::Mouse(mouse) if mouse.kind == MouseKind::Down => self.root.is_some_and(|root| {
                    self.child_at(root, self.make_local(root, mouse.pos)) == Some(status)
                }),
                _ => false,
            };
            if wants {
                self.handle_event(status, &mut ev);
            }
        }
        ev
    }

    /// Background work between events: refresh the status line and announce
    /// command set changes.
    pub fn idle(&mut self) {
        if let Some(status) = self.status_line {
            if let Some(mut widget) = self.take_widget(status) {
                widget.idle(self, status);
                self.restore_widget(status, widget);
            }
        }
        if self.command_set_changed {
            self.command_set_changed = false;
            if let Some(root) = self.root {
                self.message(root, Event::broadcast(CM_COMMAND_SET_CHANGED, Info::None));
            }
        }
    }

    /// Run `view` modally inside `owner` and return the command that ended
    /// it. An unowned view is inserted for the duration. Selection, options,
    /// the command set and the top view are restored afterwards.
    pub fn exec_view(&mut self, owner: ViewId, view: ViewId) -> u16 {
        if !self.contains(view) || !self.is_group(owner) {
            return CM_CANCEL;
        }
        let saved_options = self.options(view);
        let saved_owner = self.owner(view);
        let saved_top = self.top_view;
        let saved_current = self.current(owner);
        let saved_commands = self.commands.clone();

        self.top_view = Some(view);
        self.set_options(view, saved_options & !Options::SELECTABLE);
        self.apply_state(view, StateFlags::MODAL, true);
        if saved_owner.is_none() && self.insert(owner, view).is_err() {
            tracing::warn!(?view, ?owner, "cannot insert modal view");
        }
        self.set_current(owner, Some(view), SelectMode::Enter);
        tracing::debug!(?view, "modal loop entered");

        let executor = self
            .node(view)
            .and_then(|n| n.widget.as_ref())
            .and_then(|w| w.executor());
        let result = match executor {
            Some(run) => run(self, view),
            None => self.execute(view),
        };

        if saved_owner.is_none() && self.is_member(owner, view) {
            let _ = self.remove(owner, view);
        }
        let restore = saved_current.filter(|&c| self.is_member(owner, c));
        self.set_current(owner, restore, SelectMode::Leave);
        if self.contains(view) {
            self.apply_state(view, StateFlags::MODAL, false);
            self.set_options(view, saved_options);
        }
        self.top_view = saved_top;
        self.set_commands(saved_commands);
        tracing::debug!(?view, result, "modal loop left");
        result
    }

    /// The stock modal loop: pump events into `id` until something calls
    /// [`end_modal`](ViewTree::end_modal) and the view accepts the result.
    /// Exhausted input ends the loop with `CM_CANCEL`.
    pub fn execute(&mut self, id: ViewId) -> u16 {
        loop {
            if let Some(node) = self.node_mut(id) {
                node.end_state = 0;
            }
            loop {
                let mut ev = self.get_event();
                if ev.is_nothing() && self.input_exhausted() {
                    self.flush();
                    return CM_CANCEL;
                }
                self.handle_event(id, &mut ev);
                if !ev.is_nothing() {
                    tracing::trace!(?ev, "unhandled event");
                }
                self.flush();
                if !self.contains(id) {
                    return CM_CANCEL;
                }
                if self.end_state(id) != 0 {
                    break;
                }
            }
            let end = self.end_state(id);
            if self.valid(id, end) || self.input_exhausted() {
                return end;
            }
        }
    }

    pub fn end_state(&self, id: ViewId) -> u16 {
        self.node(id).map(|n| n.end_state).unwrap_or(0)
    }

    /// End the innermost modal loop that contains `id`.
    pub fn end_modal(&mut self, id: ViewId, command: u16) {
        let mut cursor = Some(id);
        while let Some(view) = cursor {
            if self.state(view).contains(StateFlags::MODAL) {
                if let Some(node) = self.node_mut(view) {
                    node.end_state = command;
                }
                return;
            }
            cursor = self.owner(view);
        }
        if let Some(top) = self.top_view() {
            if let Some(node) = self.node_mut(top) {
                node.end_state = command;
            }
        }
    }

    /// Run `id` modally once its widget is back in place, then post the
    /// resulting command if it is enabled.
    pub fn request_exec(&mut self, id: ViewId) {
        let busy = self.node(id).is_some_and(|n| n.widget.is_none());
        if busy {
            if !self.deferred_exec.contains(&id) {
                self.deferred_exec.push(id);
            }
        } else {
            self.exec_and_post(id);
        }
    }

    pub(super) fn exec_and_post(&mut self, id: ViewId) {
        let Some(owner) = self.owner(id) else {
            return;
        };
        let result = self.exec_view(owner, id);
        if result != 0 && self.command_enabled(result) {
            self.put_event(Event::command(result));
        }
    }

    /// Drag `id` from the press `start` within its owner once its widget is
    /// back in place. `mode` is added to the view's own drag mode.
    pub fn request_drag(&mut self, id: ViewId, start: MouseEvent, mode: DragMode) {
        let busy = self.node(id).is_some_and(|n| n.widget.is_none());
        if busy {
            self.deferred_drag.push((id, start, mode));
        } else {
            self.run_drag(id, start, mode);
        }
    }

    pub(super) fn run_drag(&mut self, id: ViewId, start: MouseEvent, mode: DragMode) {
        let limits = match self.owner(id) {
            Some(owner) => self.extent(owner),
            None => return,
        };
        let (min, max) = self.size_limits(id);
        let mode = self.drag_mode(id) | mode;
        let mut ev = Event::Mouse(start);
        self.drag_view(id, &mut ev, mode, limits, min, max);
    }

    /// Wait for the next mouse event of interest while a button is held.
    /// Returns false at button release or when input runs out.
    pub fn mouse_event(&mut self, ev: &mut Event, mask: EventMask) -> bool {
        loop {
            let next = self.get_event();
            *ev = next;
            match next {
                Event::Mouse(mouse) if mouse.kind == MouseKind::Up => return false,
                Event::Mouse(_) if next.mask().intersects(mask) => return true,
                Event::Nothing if self.input_exhausted() => return false,
                _ => {}
            }
        }
    }

    /// Track the mouse from the press in `ev`, moving (`DragMode::MOVE`) or
    /// resizing `id` within `limits` until the button is released.
    pub fn drag_view(
        &mut self,
        id: ViewId,
        ev: &mut Event,
        mode: DragMode,
        limits: Rect,
        min: Point,
        max: Point,
    ) {
        let Some(start) = ev.as_mouse().copied() else {
            return;
        };
        if start.kind != MouseKind::Down {
            return;
        }
        self.apply_state(id, StateFlags::DRAGGING, true);
        let moving = mode.contains(DragMode::MOVE);
        let anchor = if moving {
            self.origin(id) - start.pos
        } else {
            self.size(id) - start.pos
        };
        loop {
            if let Some(mouse) = ev.as_mouse() {
                if moving {
                    let size = self.size(id);
                    self.move_grow(id, mouse.pos + anchor, size, limits, min, max, mode);
                } else {
                    let origin = self.origin(id);
                    self.move_grow(id, origin, mouse.pos + anchor, limits, min, max, mode);
                }
                self.flush();
            }
            if !self.mouse_event(ev, EventMask::MOUSE_MOVE) {
                break;
            }
        }
        self.apply_state(id, StateFlags::DRAGGING, false);
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/ui/core/dispatch.rs"]
mod tests;
