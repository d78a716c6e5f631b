//! Selection, focus and z-order.
//!
//! A group's current child is SELECTED; it is also FOCUSED exactly when the
//! group itself is focused, so the focused views always form one chain from
//! the root down.

use super::flags::{Options, StateFlags};
use super::tree::{SelectMode, ViewId, ViewTree};
use crate::core::command::CM_RELEASED_FOCUS;

impl ViewTree {
    /// Make `view` the current child of `group`, moving selection and focus.
    /// Both the old and the new current are repainted.
    pub fn set_current(&mut self, group: ViewId, view: Option<ViewId>, mode: SelectMode) {
        let previous = self.current(group);
        if previous == view {
            return;
        }
        let group_focused = self.state(group).contains(StateFlags::FOCUSED);
        self.lock(group);
        if let Some(prev) = previous {
            if group_focused {
                self.apply_state(prev, StateFlags::FOCUSED, false);
            }
            if mode != SelectMode::Enter {
                self.apply_state(prev, StateFlags::SELECTED, false);
            }
        }
        if let Some(next) = view {
            if mode != SelectMode::Leave {
                self.apply_state(next, StateFlags::SELECTED, true);
            }
            if group_focused {
                self.apply_state(next, StateFlags::FOCUSED, true);
            }
        }
        if let Some(g) = self.group_mut(group) {
            g.current = view;
        }
        if let Some(prev) = previous {
            self.draw_view(prev);
        }
        if let Some(next) = view {
            self.draw_view(next);
        }
        self.unlock(group);
        tracing::trace!(?group, ?previous, ?view, "current changed");
    }

    /// Select the front-most visible, selectable child (or nothing).
    pub fn reset_current(&mut self, group: ViewId) {
        let next = self.first_match(group, StateFlags::VISIBLE, Options::SELECTABLE);
        self.set_current(group, next, SelectMode::Normal);
    }

    /// Make `id` its owner's current child. Top-select views are also
    /// brought to the front.
    pub fn select(&mut self, id: ViewId) {
        if !self.options(id).contains(Options::SELECTABLE) {
            return;
        }
        let Some(owner) = self.owner(id) else {
            return;
        };
        if self.options(id).contains(Options::TOP_SELECT) {
            self.make_first(id);
        }
        if self.current(owner) != Some(id) {
            self.set_current(owner, Some(id), SelectMode::Normal);
        }
    }

    /// Select `id` and every owner up to a selected or modal ancestor. Fails
    /// without side effects when a current view on the way refuses to let go.
    pub fn focus(&mut self, id: ViewId) -> bool {
        if self
            .state(id)
            .intersects(StateFlags::SELECTED | StateFlags::MODAL)
        {
            return true;
        }
        let Some(owner) = self.owner(id) else {
            return true;
        };
        if !self.focus(owner) {
            return false;
        }
        if let Some(current) = self.current(owner) {
            if current != id
                && self.options(current).contains(Options::VALIDATE)
                && !self.valid(current, CM_RELEASED_FOCUS)
            {
                tracing::debug!(?current, "focus change vetoed");
                return false;
            }
        }
        self.select(id);
        true
    }

    /// Ask `id` whether `command` may proceed. Groups also consult their
    /// children: the current one for focus release, all of them otherwise.
    pub fn valid(&mut self, id: ViewId, command: u16) -> bool {
        if !self.with_widget(id, |w, _| w.valid(command)).unwrap_or(true) {
            return false;
        }
        if !self.is_group(id) {
            return true;
        }
        if command == CM_RELEASED_FOCUS {
            return match self.current(id) {
                Some(current) if self.options(current).contains(Options::VALIDATE) => {
                    self.valid(current, command)
                }
                _ => true,
            };
        }
        let children = self.children(id).to_vec();
        children.into_iter().all(|child| self.valid(child, command))
    }

    fn next_candidate(&self, group: ViewId, forwards: bool) -> Vec<ViewId> {
        let children = self.children(group);
        let Some(start) = self
            .current(group)
            .and_then(|c| children.iter().position(|&v| v == c))
        else {
            return Vec::new();
        };
        let n = children.len();
        (1..n)
            .map(|step| {
                if forwards {
                    children[(start + step) % n]
                } else {
                    children[(start + n - step) % n]
                }
            })
            .filter(|&c| {
                let state = self.state(c);
                state.contains(StateFlags::VISIBLE)
                    && !state.contains(StateFlags::DISABLED)
                    && self.options(c).contains(Options::SELECTABLE)
            })
            .collect()
    }

    /// Select the next eligible child after the current one, wrapping around.
    /// `forwards` moves toward the back of the z-order.
    pub fn select_next(&mut self, group: ViewId, forwards: bool) {
        if let Some(&next) = self.next_candidate(group, forwards).first() {
            self.select(next);
        }
    }

    /// Like [`select_next`](ViewTree::select_next) but honours focus vetoes.
    pub fn focus_next(&mut self, group: ViewId, forwards: bool) -> bool {
        match self.next_candidate(group, forwards).first() {
            Some(&next) => self.focus(next),
            None => true,
        }
    }

    /// Move `id` directly in front of `target` (behind every sibling when
    /// `None`) and repaint the area it covers.
    pub fn put_in_front_of(&mut self, id: ViewId, target: Option<ViewId>) {
        let Some(owner) = self.owner(id) else {
            return;
        };
        if target == Some(id) || target == self.next_view(id) {
            return;
        }
        if let Some(t) = target {
            if !self.is_member(owner, t) {
                return;
            }
        }
        if let Some(group) = self.group_mut(owner) {
            group.children.retain(|&c| c != id);
            let pos = target
                .and_then(|t| group.children.iter().position(|&c| c == t))
                .unwrap_or(group.children.len());
            group.children.insert(pos, id);
        }
        if self.state(id).contains(StateFlags::VISIBLE) {
            let rect = self.bounds(id);
            self.redraw_under(owner, rect, None);
        }
        if self.options(id).contains(Options::SELECTABLE) {
            self.reset_current(owner);
        }
    }

    pub fn make_first(&mut self, id: ViewId) {
        let Some(owner) = self.owner(id) else {
            return;
        };
        let first = self.children(owner).first().copied();
        self.put_in_front_of(id, first);
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/ui/core/focus.rs"]
mod tests;
