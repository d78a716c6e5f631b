//! The desktop: a patterned background with windows in front of it.

use crate::core::command::{CM_NEXT, CM_PREV, CM_RELEASED_FOCUS};
use crate::core::error::Result;
use crate::core::event::Event;
use crate::persist::{self, tags, LoadCx, PersistError, SaveCx};
use crate::ui::core::flags::GrowMode;
use crate::ui::core::geom::Rect;
use crate::ui::core::palette::{self, Palette};
use crate::ui::core::tree::{ViewId, ViewTree};
use crate::ui::core::widget::{DrawCx, Widget};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Background {
    pattern: char,
}

impl Background {
    pub fn create(tree: &mut ViewTree, bounds: Rect, pattern: char) -> ViewId {
        let id = tree.create(bounds, Box::new(Background { pattern }));
        tree.set_grow_mode(id, GrowMode::HI_X | GrowMode::HI_Y);
        id
    }

    pub fn pattern(&self) -> char {
        self.pattern
    }
}

impl Widget for Background {
    fn draw(&self, cx: &mut DrawCx<'_>) {
        cx.fill(self.pattern, 1);
    }

    fn palette(&self) -> Palette {
        palette::BACKGROUND
    }

    fn class_tag(&self) -> u16 {
        tags::BACKGROUND
    }

    fn save(&self, _cx: &SaveCx<'_>) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

pub(crate) fn construct_background(data: &Value) -> std::result::Result<Box<dyn Widget>, PersistError> {
    let background: Background = persist::decode(tags::BACKGROUND, data)?;
    Ok(Box::new(background))
}

#[derive(Debug, Default)]
pub struct Desktop {
    background: Option<ViewId>,
}

impl Desktop {
    pub fn create(tree: &mut ViewTree, bounds: Rect, pattern: char) -> Result<ViewId> {
        let id = tree.create_group(bounds, Box::new(Desktop::default()));
        tree.set_grow_mode(id, GrowMode::HI_X | GrowMode::HI_Y);
        let extent = tree.extent(id);
        let background = Background::create(tree, extent, pattern);
        tree.insert(id, background)?;
        if let Some(desktop) = tree.widget_mut::<Desktop>(id) {
            desktop.background = Some(background);
        }
        Ok(id)
    }

    pub fn background(&self) -> Option<ViewId> {
        self.background
    }
}

impl Widget for Desktop {
    fn handle_event(&mut self, tree: &mut ViewTree, id: ViewId, ev: &mut Event) {
        tree.group_handle_event(id, ev);
        let Some(command) = ev.as_command() else {
            return;
        };
        match command {
            CM_NEXT => {
                if tree.valid(id, CM_RELEASED_FOCUS) {
                    tree.select_next(id, false);
                }
            }
            CM_PREV => {
                if tree.valid(id, CM_RELEASED_FOCUS) {
                    if let Some(current) = tree.current(id) {
                        tree.put_in_front_of(current, self.background);
                    }
                }
            }
            _ => return,
        }
        tree.clear_event(id, ev);
    }

    fn class_tag(&self) -> u16 {
        tags::DESKTOP
    }

    fn save(&self, cx: &SaveCx<'_>) -> Value {
        json!({ "background": self.background.and_then(|b| cx.index_of(b)) })
    }

    fn resolve(&mut self, data: &Value, cx: &LoadCx<'_>) -> std::result::Result<(), PersistError> {
        #[derive(Deserialize)]
        struct Saved {
            background: Option<u32>,
        }
        let saved: Saved = persist::decode(tags::DESKTOP, data)?;
        self.background = saved.background.map(|index| cx.view(index)).transpose()?;
        Ok(())
    }
}

pub(crate) fn construct_desktop(_data: &Value) -> std::result::Result<Box<dyn Widget>, PersistError> {
    Ok(Box::new(Desktop::default()))
}

#[cfg(test)]
#[path = "../../../tests/unit/ui/widgets/desktop.rs"]
mod tests;
