//! Command ids and the enabled-command set.
//!
//! Ids below 256 can be disabled; larger ids are always enabled. Standard
//! commands occupy the low range, applications allocate their own above
//! `FIRST_USER`.

pub const CM_VALID: u16 = 0;
pub const CM_QUIT: u16 = 1;
pub const CM_ERROR: u16 = 2;
pub const CM_MENU: u16 = 3;
pub const CM_CLOSE: u16 = 4;
pub const CM_ZOOM: u16 = 5;
pub const CM_RESIZE: u16 = 6;
pub const CM_NEXT: u16 = 7;
pub const CM_PREV: u16 = 8;
pub const CM_OK: u16 = 10;
pub const CM_CANCEL: u16 = 11;
pub const CM_YES: u16 = 12;
pub const CM_NO: u16 = 13;
pub const CM_DEFAULT: u16 = 14;

/// First id free for applications.
pub const FIRST_USER: u16 = 100;

// Broadcasts raised by the view engine itself.
pub const CM_RECEIVED_FOCUS: u16 = 50;
pub const CM_RELEASED_FOCUS: u16 = 51;
pub const CM_COMMAND_SET_CHANGED: u16 = 52;
pub const CM_SELECT_WINDOW_NUM: u16 = 55;
pub const CM_SCREEN_RESIZED: u16 = 56;

/// The process-wide set of enabled commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSet {
    bits: [u64; 4],
}

impl Default for CommandSet {
    fn default() -> Self {
        Self::all()
    }
}

impl CommandSet {
    pub fn all() -> Self {
        Self { bits: [u64::MAX; 4] }
    }

    pub fn empty() -> Self {
        Self { bits: [0; 4] }
    }

    pub fn has(&self, command: u16) -> bool {
        if command > 255 {
            return true;
        }
        let (word, bit) = Self::slot(command);
        self.bits[word] & bit != 0
    }

    /// Returns true when the set actually changed.
    pub fn enable(&mut self, command: u16) -> bool {
        if command > 255 {
            return false;
        }
        let (word, bit) = Self::slot(command);
        let before = self.bits[word];
        self.bits[word] |= bit;
        before != self.bits[word]
    }

    /// Returns true when the set actually changed.
    pub fn disable(&mut self, command: u16) -> bool {
        if command > 255 {
            return false;
        }
        let (word, bit) = Self::slot(command);
        let before = self.bits[word];
        self.bits[word] &= !bit;
        before != self.bits[word]
    }

    fn slot(command: u16) -> (usize, u64) {
        (usize::from(command / 64), 1u64 << (command % 64))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/command.rs"]
mod tests;
