//! Palette tables.
//!
//! Every view maps a logical colour index through its own palette, then
//! through each owner's palette in turn. Only the root palette holds physical
//! attributes; an empty palette passes indices through unchanged.

use super::draw_buffer::Attr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Palette(&'static [u8]);

impl Palette {
    pub const EMPTY: Palette = Palette(&[]);

    pub const fn new(entries: &'static [u8]) -> Self {
        Self(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 1-based lookup. Index 0 and indices past the end have no entry.
    pub fn get(&self, index: u8) -> Option<u8> {
        let i = usize::from(index).checked_sub(1)?;
        self.0.get(i).copied()
    }
}

/// Walk `index` through a palette chain ordered from the view outward to the
/// root. A zero index, a missing entry, or an entry of zero resolves to
/// [`Attr::ERROR`].
pub fn resolve_chain<I>(chain: I, index: u8) -> Attr
where
    I: IntoIterator<Item = Palette>,
{
    if index == 0 {
        return Attr::ERROR;
    }
    let mut color = index;
    for palette in chain {
        if palette.is_empty() {
            continue;
        }
        match palette.get(color) {
            Some(next) if next != 0 => color = next,
            _ => {
                tracing::trace!(index, color, "broken palette chain");
                return Attr::ERROR;
            }
        }
    }
    Attr(color)
}

/// Root palette of the program: physical attributes for every widget family.
///
/// 1: desktop background, 2-7: menus and status line, 8-15: blue window,
/// 16-23: cyan window, 24-31: gray window, 32-63: dialog controls.
pub const APP_COLOR: Palette = Palette::new(&[
    0x71, 0x70, 0x78, 0x74, 0x20, 0x28, 0x24, 0x17, 0x1F, 0x1A, 0x31, 0x31, 0x1E, 0x71, 0x1F,
    0x37, 0x3F, 0x3A, 0x13, 0x13, 0x3E, 0x21, 0x3F, 0x70, 0x7F, 0x7A, 0x13, 0x13, 0x70, 0x7F,
    0x7E, 0x70, 0x7F, 0x7A, 0x13, 0x13, 0x70, 0x70, 0x7F, 0x7E, 0x20, 0x2B, 0x2F, 0x78, 0x2E,
    0x70, 0x30, 0x3F, 0x3E, 0x1F, 0x2F, 0x1A, 0x20, 0x72, 0x31, 0x31, 0x30, 0x2F, 0x3E, 0x31,
    0x13, 0x38, 0x00,
]);

pub const BACKGROUND: Palette = Palette::new(&[0x01]);

/// normal, disabled, shortcut, selected, selected disabled, selected shortcut.
pub const MENU_VIEW: Palette = Palette::new(&[0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);

pub const STATUS_LINE: Palette = Palette::new(&[0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);

pub const BLUE_WINDOW: Palette = Palette::new(&[0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F]);

pub const CYAN_WINDOW: Palette = Palette::new(&[0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17]);

pub const GRAY_WINDOW: Palette = Palette::new(&[0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E, 0x1F]);

/// passive frame, passive title, active frame, active title, icons.
pub const FRAME: Palette = Palette::new(&[0x01, 0x01, 0x02, 0x02, 0x03]);

#[cfg(test)]
#[path = "../../../tests/unit/ui/core/palette.rs"]
mod tests;
