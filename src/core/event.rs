use crate::ui::core::flags::EventMask;
use crate::ui::core::geom::Point;
use crate::ui::core::tree::ViewId;
use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Char(char),
    Enter,
    Tab,
    BackTab,
    Esc,
    Backspace,
    Delete,
    Insert,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct KeyModifiers(u8);

impl KeyModifiers {
    pub const NONE: Self = Self(0);
    pub const SHIFT: Self = Self(1 << 0);
    pub const CONTROL: Self = Self(1 << 1);
    pub const ALT: Self = Self(1 << 2);
    pub const SUPER: Self = Self(1 << 3);

    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for KeyModifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for KeyModifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A key press: the key code plus the modifiers held with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub fn ch(ch: char) -> Self {
        Self::plain(KeyCode::Char(ch))
    }

    pub fn alt(ch: char) -> Self {
        Self::new(KeyCode::Char(ch), KeyModifiers::ALT)
    }

    pub fn ctrl(ch: char) -> Self {
        Self::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    /// The printable character of an unmodified (or shifted) key.
    pub fn char_code(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(ch)
                if !self
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                Some(ch)
            }
            _ => None,
        }
    }

    /// The uppercased letter of an Alt-<letter> chord.
    pub fn alt_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(ch) if self.modifiers.contains(KeyModifiers::ALT) => {
                Some(ch.to_ascii_uppercase())
            }
            _ => None,
        }
    }

    /// Map the WordStar control diamond (Ctrl-E/X/S/D and friends) onto arrow
    /// and navigation keys; other keys are returned unchanged.
    pub fn ctrl_to_arrow(&self) -> KeyCode {
        if self.modifiers != KeyModifiers::CONTROL {
            return self.code;
        }
        match self.code {
            KeyCode::Char('e') | KeyCode::Char('E') => KeyCode::Up,
            KeyCode::Char('x') | KeyCode::Char('X') => KeyCode::Down,
            KeyCode::Char('s') | KeyCode::Char('S') => KeyCode::Left,
            KeyCode::Char('d') | KeyCode::Char('D') => KeyCode::Right,
            KeyCode::Char('r') | KeyCode::Char('R') => KeyCode::PageUp,
            KeyCode::Char('c') | KeyCode::Char('C') => KeyCode::PageDown,
            KeyCode::Char('v') | KeyCode::Char('V') => KeyCode::Insert,
            KeyCode::Char('g') | KeyCode::Char('G') => KeyCode::Delete,
            KeyCode::Char('h') | KeyCode::Char('H') => KeyCode::Backspace,
            other => other,
        }
    }

    /// Canonical form used to compare hot keys: uppercase letters become
    /// lowercase with SHIFT.
    pub fn normalized(&self) -> Self {
        let mut code = self.code;
        let mut modifiers = self.modifiers;
        if let KeyCode::Char(ch) = code {
            if ch.is_ascii_uppercase() {
                code = KeyCode::Char(ch.to_ascii_lowercase());
                modifiers |= KeyModifiers::SHIFT;
            }
        }
        Self::new(code, modifiers)
    }

    pub fn matches(&self, other: &KeyEvent) -> bool {
        self.normalized() == other.normalized()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MouseButtons(u8);

impl MouseButtons {
    pub const NONE: Self = Self(0);
    pub const LEFT: Self = Self(1 << 0);
    pub const RIGHT: Self = Self(1 << 1);
    pub const MIDDLE: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for MouseButtons {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseKind {
    Down,
    Up,
    Move,
    /// Repeated while a button is held without movement.
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseKind,
    /// Screen coordinates.
    pub pos: Point,
    pub buttons: MouseButtons,
    pub double: bool,
    pub modifiers: KeyModifiers,
}

impl MouseEvent {
    pub fn new(kind: MouseKind, pos: Point, buttons: MouseButtons) -> Self {
        Self {
            kind,
            pos,
            buttons,
            double: false,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn down(x: i16, y: i16) -> Self {
        Self::new(MouseKind::Down, Point::new(x, y), MouseButtons::LEFT)
    }

    pub fn up(x: i16, y: i16) -> Self {
        Self::new(MouseKind::Up, Point::new(x, y), MouseButtons::NONE)
    }

    pub fn drag(x: i16, y: i16) -> Self {
        Self::new(MouseKind::Move, Point::new(x, y), MouseButtons::LEFT)
    }
}

/// Payload carried by command and broadcast messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Info {
    #[default]
    None,
    View(ViewId),
    Value(i64),
}

impl Info {
    /// A screen size packed into a value payload.
    pub fn size(width: u16, height: u16) -> Self {
        Info::Value(i64::from(width) << 16 | i64::from(height))
    }

    pub fn as_size(&self) -> Option<Point> {
        match *self {
            Info::Value(v) if v >= 0 => {
                let w = (v >> 16) & 0xFFFF;
                let h = v & 0xFFFF;
                Some(Point::new(w as i16, h as i16))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub command: u16,
    pub info: Info,
}

impl Message {
    pub fn new(command: u16, info: Info) -> Self {
        Self { command, info }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Event {
    #[default]
    Nothing,
    KeyDown(KeyEvent),
    Mouse(MouseEvent),
    Command(Message),
    Broadcast(Message),
}

impl Event {
    pub fn command(command: u16) -> Self {
        Event::Command(Message::new(command, Info::None))
    }

    pub fn broadcast(command: u16, info: Info) -> Self {
        Event::Broadcast(Message::new(command, info))
    }

    pub fn key(code: KeyCode) -> Self {
        Event::KeyDown(KeyEvent::plain(code))
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Event::Nothing)
    }

    /// The mask bit this event is filtered by.
    pub fn mask(&self) -> EventMask {
        match self {
            Event::Nothing => EventMask::NONE,
            Event::KeyDown(_) => EventMask::KEY_DOWN,
            Event::Mouse(m) => match m.kind {
                MouseKind::Down => EventMask::MOUSE_DOWN,
                MouseKind::Up => EventMask::MOUSE_UP,
                MouseKind::Move => EventMask::MOUSE_MOVE,
                MouseKind::Auto => EventMask::MOUSE_AUTO,
            },
            Event::Command(_) => EventMask::COMMAND,
            Event::Broadcast(_) => EventMask::BROADCAST,
        }
    }

    pub fn as_key(&self) -> Option<&KeyEvent> {
        match self {
            Event::KeyDown(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_mouse(&self) -> Option<&MouseEvent> {
        match self {
            Event::Mouse(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_command(&self) -> Option<u16> {
        match self {
            Event::Command(m) => Some(m.command),
            _ => None,
        }
    }

    pub fn as_broadcast(&self) -> Option<&Message> {
        match self {
            Event::Broadcast(m) => Some(m),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        *self = Event::Nothing;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/event.rs"]
mod tests;
