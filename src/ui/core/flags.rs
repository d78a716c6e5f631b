use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

macro_rules! bitset {
    ($(#[$attr:meta])* $name:ident($repr:ty) { $($(#[$cattr:meta])* $flag:ident = $value:expr;)* }) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub struct $name($repr);

        impl $name {
            pub const NONE: Self = Self(0);
            $($(#[$cattr])* pub const $flag: Self = Self($value);)*

            pub const fn from_bits(bits: $repr) -> Self {
                Self(bits)
            }

            pub const fn bits(self) -> $repr {
                self.0
            }

            pub fn contains(self, other: Self) -> bool {
                (self.0 & other.0) == other.0
            }

            pub fn intersects(self, other: Self) -> bool {
                (self.0 & other.0) != 0
            }

            pub fn is_empty(self) -> bool {
                self.0 == 0
            }

            pub fn set(&mut self, other: Self, enable: bool) {
                if enable {
                    self.0 |= other.0;
                } else {
                    self.0 &= !other.0;
                }
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self::Output {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl BitAnd for $name {
            type Output = Self;

            fn bitand(self, rhs: Self) -> Self::Output {
                Self(self.0 & rhs.0)
            }
        }

        impl Not for $name {
            type Output = Self;

            fn not(self) -> Self::Output {
                Self(!self.0)
            }
        }
    };
}

bitset! {
    /// Runtime state of a view. Changed one bit at a time through
    /// `ViewTree::set_state`.
    StateFlags(u16) {
        VISIBLE = 0x001;
        CURSOR_VIS = 0x002;
        CURSOR_INS = 0x004;
        SHADOW = 0x008;
        ACTIVE = 0x010;
        SELECTED = 0x020;
        FOCUSED = 0x040;
        DRAGGING = 0x080;
        DISABLED = 0x100;
        MODAL = 0x200;
        DEFAULT = 0x400;
        EXPOSED = 0x800;
    }
}

bitset! {
    Options(u16) {
        SELECTABLE = 0x001;
        /// Selecting the view also brings it to the front of its owner.
        TOP_SELECT = 0x002;
        /// A click that selects the view is also handed to it.
        FIRST_CLICK = 0x004;
        FRAMED = 0x008;
        PRE_PROCESS = 0x010;
        POST_PROCESS = 0x020;
        /// Groups keep their own cell buffer while exposed.
        BUFFERED = 0x040;
        TILEABLE = 0x080;
        CENTER_X = 0x100;
        CENTER_Y = 0x200;
        /// `valid` is consulted before the view gives up focus.
        VALIDATE = 0x400;
    }
}

bitset! {
    EventMask(u16) {
        MOUSE_DOWN = 0x0001;
        MOUSE_UP = 0x0002;
        MOUSE_MOVE = 0x0004;
        MOUSE_AUTO = 0x0008;
        KEY_DOWN = 0x0010;
        COMMAND = 0x0100;
        BROADCAST = 0x0200;
        MOUSE = 0x000F;
        KEYBOARD = 0x0010;
        MESSAGE = 0xFF00;
        /// Mouse and keyboard, the events routed by position or focus.
        POSITIONAL = 0x000F;
        FOCUSED = 0x0010 | 0x0100;
        ALL = 0xFFFF;
    }
}

bitset! {
    /// How a view follows its owner when the owner changes size.
    GrowMode(u8) {
        LO_X = 0x01;
        LO_Y = 0x02;
        HI_X = 0x04;
        HI_Y = 0x08;
        ALL = 0x0F;
        /// Scale proportionally instead of shifting.
        REL = 0x10;
    }
}

bitset! {
    DragMode(u8) {
        MOVE = 0x01;
        GROW = 0x02;
        LIMIT_LO_X = 0x10;
        LIMIT_LO_Y = 0x20;
        LIMIT_HI_X = 0x40;
        LIMIT_HI_Y = 0x80;
        LIMIT_ALL = 0xF0;
    }
}

bitset! {
    /// What the user may do to a window through its frame.
    WindowFlags(u8) {
        MOVE = 0x01;
        GROW = 0x02;
        CLOSE = 0x04;
        ZOOM = 0x08;
        ALL = 0x0F;
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/ui/core/flags.rs"]
mod tests;
