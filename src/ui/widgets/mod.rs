//! Stock widgets built on the view engine.

pub mod desktop;
pub mod menu;
pub mod menu_view;
pub mod status_line;
pub mod window;

use crate::persist::{tags, Constructor};
use crate::ui::core::widget::{PlainGroup, PlainView, Widget};

pub use desktop::{Background, Desktop};
pub use menu::{Menu, MenuItem};
pub use menu_view::{MenuLayout, MenuView};
pub use status_line::{StatusDef, StatusItem, StatusLine};
pub use window::{Frame, Window, WindowPalette};

fn plain_view(_data: &serde_json::Value) -> Result<Box<dyn Widget>, crate::persist::PersistError> {
    Ok(Box::new(PlainView))
}

fn plain_group(_data: &serde_json::Value) -> Result<Box<dyn Widget>, crate::persist::PersistError> {
    Ok(Box::new(PlainGroup))
}

/// Constructors for every widget shipped with the crate.
pub fn builtin_constructors() -> impl Iterator<Item = (u16, Constructor)> {
    let table: [(u16, Constructor); 9] = [
        (tags::VIEW, plain_view),
        (tags::GROUP, plain_group),
        (tags::FRAME, window::construct_frame),
        (tags::WINDOW, window::construct_window),
        (tags::BACKGROUND, desktop::construct_background),
        (tags::DESKTOP, desktop::construct_desktop),
        (tags::MENU_VIEW, menu_view::construct),
        (tags::STATUS_LINE, status_line::construct),
        (tags::PROGRAM, crate::app::program::construct),
    ];
    table.into_iter()
}
