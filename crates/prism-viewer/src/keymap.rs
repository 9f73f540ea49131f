//! Key bindings of the viewer
//!
//! Bindings are plain serde data so they can be kept next to the renderer
//! settings as RON.

use std::path::Path;

use prism_core::MouseButton;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};
use crate::events::Key;

/// Action triggered by a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerAction {
    /// Switch feature picking between single pixel and brush
    ToggleBrush,
    /// Held: picks report vertices
    PickVertex,
    /// Held: picks report edges
    PickEdge,
    /// Held: picks report triangles
    PickTriangle,
    /// Held: the cast-ray button casts a ray instead of picking
    Raycast,
    FitScene,
    ResetCamera,
    ToggleWireframe,
    ToggleDebugDraw,
    ReloadShaders,
    /// Drop the current selection and gizmo
    ClearSelection,
}

/// Viewer key and mouse bindings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMapping {
    pub toggle_brush: Key,
    pub pick_vertex: Key,
    pub pick_edge: Key,
    pub pick_triangle: Key,
    pub raycast: Key,
    pub fit_scene: Key,
    pub reset_camera: Key,
    pub toggle_wireframe: Key,
    pub toggle_debug_draw: Key,
    pub reload_shaders: Key,
    pub clear_selection: Key,
    /// Drag to rotate the camera
    pub rotate_button: MouseButton,
    /// Drag to pan the camera
    pub pan_button: MouseButton,
    /// Click to select (or cast a ray with the raycast key held)
    pub select_button: MouseButton,
}

impl Default for KeyMapping {
    fn default() -> Self {
        Self {
            toggle_brush: Key::Char('C'),
            pick_vertex: Key::Char('V'),
            pick_edge: Key::Char('E'),
            pick_triangle: Key::Char('T'),
            raycast: Key::Char('R'),
            fit_scene: Key::Char('F'),
            reset_camera: Key::Home,
            toggle_wireframe: Key::Char('W'),
            toggle_debug_draw: Key::Char('D'),
            reload_shaders: Key::Char('S'),
            clear_selection: Key::Escape,
            rotate_button: MouseButton::Left,
            pan_button: MouseButton::Middle,
            select_button: MouseButton::Right,
        }
    }
}

impl KeyMapping {
    /// Action bound to `key`, if any
    pub fn action(&self, key: Key) -> Option<ViewerAction> {
        let bindings = [
            (self.toggle_brush, ViewerAction::ToggleBrush),
            (self.pick_vertex, ViewerAction::PickVertex),
            (self.pick_edge, ViewerAction::PickEdge),
            (self.pick_triangle, ViewerAction::PickTriangle),
            (self.raycast, ViewerAction::Raycast),
            (self.fit_scene, ViewerAction::FitScene),
            (self.reset_camera, ViewerAction::ResetCamera),
            (self.toggle_wireframe, ViewerAction::ToggleWireframe),
            (self.toggle_debug_draw, ViewerAction::ToggleDebugDraw),
            (self.reload_shaders, ViewerAction::ReloadShaders),
            (self.clear_selection, ViewerAction::ClearSelection),
        ];
        bindings
            .into_iter()
            .find(|(bound, _)| *bound == key)
            .map(|(_, action)| action)
    }

    /// Load bindings from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ViewerError::Io(e.to_string()))?;
        ron::from_str(&content).map_err(|e| ViewerError::Io(e.to_string()))
    }

    /// Save bindings as pretty RON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ViewerError::Io(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| ViewerError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let keys = KeyMapping::default();
        assert_eq!(keys.action(Key::Char('C')), Some(ViewerAction::ToggleBrush));
        assert_eq!(keys.action(Key::Char('V')), Some(ViewerAction::PickVertex));
        assert_eq!(keys.action(Key::Char('E')), Some(ViewerAction::PickEdge));
        assert_eq!(keys.action(Key::Char('T')), Some(ViewerAction::PickTriangle));
        assert_eq!(keys.action(Key::Char('Q')), None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.ron");
        let mut keys = KeyMapping::default();
        keys.toggle_brush = Key::Char('B');
        keys.save(&path).unwrap();

        let loaded = KeyMapping::load(&path).unwrap();
        assert_eq!(loaded, keys);
        assert_eq!(loaded.action(Key::Char('B')), Some(ViewerAction::ToggleBrush));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let keys: KeyMapping = ron::from_str("(raycast: Char('X'))").unwrap();
        assert_eq!(keys.raycast, Key::Char('X'));
        assert_eq!(keys.pick_edge, Key::Char('E'));
    }
}
