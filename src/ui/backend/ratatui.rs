use crate::ui::backend::Backend;
use crate::ui::core::draw_buffer::{Attr, Cell};
use crate::ui::core::geom::Point;
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Color as RColor, Style as RStyle};
use ratatui::Terminal;
use std::io;

/// Terminal sink. Commits land in a shadow copy of the screen; `present`
/// repaints the terminal from it and ratatui diffs against the previous frame.
pub struct RatatuiBackend {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    width: u16,
    height: u16,
    screen: Vec<Cell>,
    cursor: Option<Point>,
    dirty: bool,
}

impl RatatuiBackend {
    pub fn new(stdout: io::Stdout) -> io::Result<Self> {
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        let size = terminal.size()?;
        Ok(Self {
            terminal,
            width: size.width,
            height: size.height,
            screen: vec![Cell::default(); size.width as usize * size.height as usize],
            cursor: None,
            dirty: true,
        })
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }
}

impl Backend for RatatuiBackend {
    fn commit(&mut self, x: i16, y: i16, width: u16, height: u16, cells: &[Cell]) {
        for row in 0..height {
            let sy = i32::from(y) + i32::from(row);
            if sy < 0 || sy >= i32::from(self.height) {
                continue;
            }
            for col in 0..width {
                let sx = i32::from(x) + i32::from(col);
                if sx < 0 || sx >= i32::from(self.width) {
                    continue;
                }
                if let Some(cell) = cells.get(row as usize * width as usize + col as usize) {
                    self.screen[sy as usize * self.width as usize + sx as usize] = *cell;
                }
            }
        }
        self.dirty = true;
    }

    /// The next commit repaints everything.
    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.screen = vec![Cell::default(); width as usize * height as usize];
        self.dirty = true;
    }

    fn set_cursor(&mut self, pos: Option<Point>) {
        if self.cursor != pos {
            self.cursor = pos;
            self.dirty = true;
        }
    }

    fn present(&mut self) -> io::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.dirty = false;
        let (width, height, cursor) = (self.width, self.height, self.cursor);
        let screen = &self.screen;
        self.terminal.draw(|frame| {
            let area = frame.area();
            let buf = frame.buffer_mut();
            for y in 0..area.height.min(height) {
                for x in 0..area.width.min(width) {
                    let src = screen[y as usize * width as usize + x as usize];
                    if let Some(cell) = buf.cell_mut((x, y)) {
                        cell.set_char(src.ch).set_style(to_ratatui_style(src.attr));
                    }
                }
            }
            if let Some(pos) = cursor {
                if pos.x >= 0 && pos.y >= 0 {
                    frame.set_cursor_position((pos.x as u16, pos.y as u16));
                }
            }
        })?;
        Ok(())
    }
}

fn to_ratatui_style(attr: Attr) -> RStyle {
    RStyle::default()
        .fg(cga_color(attr.fg()))
        .bg(cga_color(attr.bg() & 0x07))
}

/// The sixteen text-mode colours in their hardware order.
fn cga_color(index: u8) -> RColor {
    match index & 0x0F {
        0x0 => RColor::Black,
        0x1 => RColor::Blue,
        0x2 => RColor::Green,
        0x3 => RColor::Cyan,
        0x4 => RColor::Red,
        0x5 => RColor::Magenta,
        0x6 => RColor::Yellow,
        0x7 => RColor::Gray,
        0x8 => RColor::DarkGray,
        0x9 => RColor::LightBlue,
        0xA => RColor::LightGreen,
        0xB => RColor::LightCyan,
        0xC => RColor::LightRed,
        0xD => RColor::LightMagenta,
        0xE => RColor::LightYellow,
        _ => RColor::White,
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/ui/backend/ratatui.rs"]
mod tests;
