//! Toolkit-independent input events
//!
//! The application translates its windowing toolkit's input into these types
//! and feeds them to [`crate::Viewer::handle_event`]. Positions are in pixels
//! from the top-left corner of the viewport.

use glam::Vec2;
use prism_core::MouseButton;
use serde::{Deserialize, Serialize};

/// Keyboard key, independent of the windowing toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Letter or digit, stored uppercase
    Char(char),
    Space,
    Escape,
    Home,
    Delete,
}

impl Key {
    /// Letter key, normalized to uppercase
    pub fn char(c: char) -> Self {
        Key::Char(c.to_ascii_uppercase())
    }
}

/// Modifier keys held during an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
    };
}

/// Input event delivered to the viewer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerEvent {
    MousePress {
        position: Vec2,
        button: MouseButton,
        modifiers: Modifiers,
    },
    MouseRelease {
        position: Vec2,
        button: MouseButton,
        modifiers: Modifiers,
    },
    MouseMove {
        position: Vec2,
        modifiers: Modifiers,
    },
    /// Wheel notches, positive away from the user
    Wheel { delta: f32, modifiers: Modifiers },
    KeyPress { key: Key, modifiers: Modifiers },
    KeyRelease { key: Key, modifiers: Modifiers },
    Resize { width: u32, height: u32 },
}
