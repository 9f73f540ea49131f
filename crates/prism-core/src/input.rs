//! Input types shared across crates

use serde::{Deserialize, Serialize};

/// Mouse button, independent of the windowing toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}
