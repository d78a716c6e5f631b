//! Menu data: items, nested submenus and the remembered default item.

use crate::core::command::CommandSet;
use crate::core::event::KeyEvent;
use crate::ui::core::draw_buffer::{cstr_len, hot_char};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Label with `~` around the shortcut letter. Empty for a separator.
    pub name: String,
    #[serde(default)]
    pub command: u16,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyEvent>,
    #[serde(default)]
    pub help_ctx: u16,
    /// Right-aligned key hint such as `F3`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub param: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submenu: Option<Menu>,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, command: u16, key: Option<KeyEvent>, help_ctx: u16) -> Self {
        Self {
            name: name.into(),
            command,
            disabled: false,
            key,
            help_ctx,
            param: String::new(),
            submenu: None,
        }
    }

    pub fn submenu(name: impl Into<String>, help_ctx: u16, menu: Menu) -> Self {
        Self {
            submenu: Some(menu),
            ..Self::new(name, 0, None, help_ctx)
        }
    }

    pub fn separator() -> Self {
        Self::new("", 0, None, 0)
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = param.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn is_separator(&self) -> bool {
        self.name.is_empty()
    }

    pub fn hot_char(&self) -> Option<char> {
        hot_char(&self.name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub items: Vec<MenuItem>,
    /// Item highlighted when the menu opens; updated every time it closes.
    #[serde(default)]
    pub default: Option<usize>,
}

impl Menu {
    pub fn new(items: Vec<MenuItem>) -> Self {
        let default = items.iter().position(|i| !i.is_separator());
        Self { items, default }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, index: usize) -> Option<&MenuItem> {
        self.items.get(index)
    }

    /// The next non-separator item after `from`, wrapping at either end.
    /// With no starting item the walk begins just outside the list.
    pub fn step(&self, from: Option<usize>, forward: bool) -> Option<usize> {
        let n = self.items.len();
        if n == 0 {
            return None;
        }
        let mut i = match (from, forward) {
            (Some(i), _) => i.min(n - 1),
            (None, true) => n - 1,
            (None, false) => 0,
        };
        for _ in 0..n {
            i = if forward { (i + 1) % n } else { (i + n - 1) % n };
            if !self.items[i].is_separator() {
                return Some(i);
            }
        }
        None
    }

    /// The enabled item whose shortcut letter is `ch`.
    pub fn find_hot(&self, ch: char) -> Option<usize> {
        let ch = ch.to_ascii_uppercase();
        self.items
            .iter()
            .position(|item| !item.is_separator() && !item.disabled && item.hot_char() == Some(ch))
    }

    /// Command of the enabled item bound to `key`, searching submenus too.
    pub fn hot_key(&self, key: &KeyEvent) -> Option<u16> {
        self.items.iter().find_map(|item| {
            if item.is_separator() {
                return None;
            }
            if let Some(sub) = &item.submenu {
                return sub.hot_key(key);
            }
            match &item.key {
                Some(bound) if !item.disabled && bound.matches(key) => Some(item.command),
                _ => None,
            }
        })
    }

    /// Sync `disabled` with the command set. Returns true if anything changed.
    pub fn update_disabled(&mut self, commands: &CommandSet) -> bool {
        let mut changed = false;
        for item in &mut self.items {
            if let Some(sub) = item.submenu.as_mut() {
                changed |= sub.update_disabled(commands);
            } else if item.command != 0 {
                let enabled = commands.has(item.command);
                if item.disabled == enabled {
                    item.disabled = !enabled;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Width of a pull-down box showing this menu, frame included.
    pub fn box_width(&self) -> i16 {
        self.items
            .iter()
            .filter(|item| !item.is_separator())
            .map(|item| {
                let mut w = cstr_len(&item.name) + 6;
                if item.submenu.is_some() {
                    w += 3;
                } else if !item.param.is_empty() {
                    w += cstr_len(&item.param) + 2;
                }
                w as i16
            })
            .fold(10, i16::max)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/ui/widgets/menu.rs"]
mod tests;
