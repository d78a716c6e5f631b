//! Line composition.
//!
//! A `DrawBuffer` holds one row of cells; views fill it and hand it to the
//! tree, which clips and copies the row into every materialized ancestor
//! buffer.

use serde::{Deserialize, Serialize};

/// A physical colour attribute: foreground in the low nibble, background in the
/// high nibble (CGA layout).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attr(pub u8);

impl Attr {
    /// Bright white on red. Returned whenever a palette chain cannot be
    /// resolved so the mistake shows on screen.
    pub const ERROR: Attr = Attr(0xCF);

    pub const fn new(fg: u8, bg: u8) -> Self {
        Self((bg & 0x0F) << 4 | (fg & 0x0F))
    }

    pub const fn fg(self) -> u8 {
        self.0 & 0x0F
    }

    pub const fn bg(self) -> u8 {
        self.0 >> 4
    }
}

/// A (normal, highlight) attribute pair, the result of resolving a two-byte
/// colour request such as `0x0301`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColorPair {
    pub normal: Attr,
    pub highlight: Attr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub ch: char,
    pub attr: Attr,
}

impl Cell {
    pub const fn new(ch: char, attr: Attr) -> Self {
        Self { ch, attr }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new(' ', Attr(0))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrawBuffer {
    cells: Vec<Cell>,
}

impl DrawBuffer {
    pub fn new(width: usize) -> Self {
        Self {
            cells: vec![Cell::default(); width],
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, x: usize) -> Option<Cell> {
        self.cells.get(x).copied()
    }

    /// Repeat `ch` `count` times from `indent`. A `'\0'` char keeps existing
    /// characters and only applies the attribute.
    pub fn move_char(&mut self, indent: usize, ch: char, attr: Attr, count: usize) {
        for cell in self.cells.iter_mut().skip(indent).take(count) {
            if ch != '\0' {
                cell.ch = ch;
            }
            cell.attr = attr;
        }
    }

    /// Write `text` from `indent`; returns the number of cells written.
    pub fn move_str(&mut self, indent: usize, text: &str, attr: Attr) -> usize {
        let mut written = 0;
        for (cell, ch) in self.cells.iter_mut().skip(indent).zip(text.chars()) {
            *cell = Cell::new(ch, attr);
            written += 1;
        }
        written
    }

    /// Write a control string where each `~` toggles between the normal and
    /// highlight attribute (used for accelerator letters).
    pub fn move_cstr(&mut self, indent: usize, text: &str, colors: ColorPair) -> usize {
        let mut highlight = false;
        let mut x = indent;
        for ch in text.chars() {
            if ch == '~' {
                highlight = !highlight;
                continue;
            }
            let Some(cell) = self.cells.get_mut(x) else {
                break;
            };
            let attr = if highlight {
                colors.highlight
            } else {
                colors.normal
            };
            *cell = Cell::new(ch, attr);
            x += 1;
        }
        x - indent
    }

    pub fn move_buf(&mut self, indent: usize, src: &[Cell]) {
        for (dst, src) in self.cells.iter_mut().skip(indent).zip(src) {
            *dst = *src;
        }
    }

    pub fn put_attribute(&mut self, indent: usize, attr: Attr) {
        if let Some(cell) = self.cells.get_mut(indent) {
            cell.attr = attr;
        }
    }

    pub fn put_char(&mut self, indent: usize, ch: char) {
        if let Some(cell) = self.cells.get_mut(indent) {
            cell.ch = ch;
        }
    }
}

/// Display width of a control string, ignoring the `~` markers.
pub fn cstr_len(text: &str) -> usize {
    text.chars().filter(|&c| c != '~').count()
}

/// The accelerator letter of a control string (the char after the first `~`),
/// uppercased.
pub fn hot_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    chars.find(|&c| c == '~')?;
    chars.next().map(|c| c.to_ascii_uppercase())
}

#[cfg(test)]
#[path = "../../../tests/unit/ui/core/draw_buffer.rs"]
mod tests;
