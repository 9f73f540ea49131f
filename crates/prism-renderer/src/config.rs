//! Renderer configuration structures
//!
//! Settings that can be serialized to and loaded from RON files. Every section
//! falls back to its defaults when missing from the file.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Viewport rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewportConfig {
    /// Background clear color (RGBA)
    pub background_color: [f32; 4],
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            background_color: [0.15, 0.15, 0.18, 1.0],
        }
    }
}

/// Picking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PickingConfig {
    /// Brush radius in pixels for circle picking
    pub brush_radius: f32,
    /// Smallest brush radius the viewer allows
    pub min_brush_radius: f32,
    /// Radius change per wheel notch
    pub brush_step: f32,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            brush_radius: 10.0,
            min_brush_radius: 5.0,
            brush_step: 5.0,
        }
    }
}

/// Post-processing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostProcessConfig {
    /// Whether tonemapping runs (otherwise the main pass is copied as is)
    pub enabled: bool,
    /// Exposure multiplier applied before tonemapping
    pub exposure: f32,
    /// Output gamma
    pub gamma: f32,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exposure: 1.0,
            gamma: 2.2,
        }
    }
}

/// Debug drawing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebugConfig {
    /// Draw (and pick) the debug queue
    pub draw_debug: bool,
    /// Draw the main queue as wireframe
    pub wireframe: bool,
    /// Opacity of x-ray objects
    pub xray_alpha: f32,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            draw_debug: true,
            wireframe: false,
            xray_alpha: 0.5,
        }
    }
}

/// Lighting configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LightingConfig {
    /// Light color (RGB)
    pub color: [f32; 3],
    /// Light intensity multiplier
    pub intensity: f32,
    /// Ambient light strength
    pub ambient_strength: f32,
    /// Keep the first light aligned with the view direction
    pub headlight: bool,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            ambient_strength: 0.3,
            headlight: true,
        }
    }
}

/// Camera default configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraConfig {
    /// Field of view in degrees
    pub fov_degrees: f32,
    /// Near clipping plane distance
    pub near_plane: f32,
    /// Far clipping plane distance
    pub far_plane: f32,
    /// Pan sensitivity multiplier
    pub pan_sensitivity: f32,
    /// Zoom sensitivity multiplier
    pub zoom_sensitivity: f32,
    /// Rotation sensitivity multiplier
    pub rotate_sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            pan_sensitivity: 1.0,
            zoom_sensitivity: 0.1,
            rotate_sensitivity: 1.0,
        }
    }
}

/// Gizmo configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GizmoConfig {
    /// Gizmo size relative to the camera distance
    pub scale: f32,
    /// Rotation snapping step in degrees
    pub rotate_step_degrees: f32,
    /// Translation snapping step in world units
    pub translate_step: f32,
    /// X-axis color (RGBA)
    pub x_axis_color: [f32; 4],
    /// Y-axis color (RGBA)
    pub y_axis_color: [f32; 4],
    /// Z-axis color (RGBA)
    pub z_axis_color: [f32; 4],
}

impl Default for GizmoConfig {
    fn default() -> Self {
        Self {
            scale: 0.15,
            rotate_step_degrees: 10.0,
            translate_step: 0.1,
            x_axis_color: [1.0, 0.2, 0.2, 1.0],
            y_axis_color: [0.2, 1.0, 0.2, 1.0],
            z_axis_color: [0.2, 0.2, 1.0, 1.0],
        }
    }
}

impl GizmoConfig {
    /// Color of the handle for axis `index` (0 = X, 1 = Y, 2 = Z)
    pub fn axis_color(&self, index: usize) -> [f32; 4] {
        match index {
            0 => self.x_axis_color,
            1 => self.y_axis_color,
            _ => self.z_axis_color,
        }
    }
}

/// Complete renderer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RendererConfig {
    /// Viewport settings
    #[serde(default)]
    pub viewport: ViewportConfig,
    /// Picking settings
    #[serde(default)]
    pub picking: PickingConfig,
    /// Post-processing settings
    #[serde(default)]
    pub post_process: PostProcessConfig,
    /// Debug drawing settings
    #[serde(default)]
    pub debug: DebugConfig,
    /// Lighting settings
    #[serde(default)]
    pub lighting: LightingConfig,
    /// Camera settings
    #[serde(default)]
    pub camera: CameraConfig,
    /// Gizmo settings
    #[serde(default)]
    pub gizmo: GizmoConfig,
}

impl RendererConfig {
    /// Create a new renderer configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron(&content)
    }

    /// Parse a configuration from RON text
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    /// Save the configuration as pretty RON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

/// Configuration file errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("IO error: {0}")]
    Io(String),
    /// The configuration could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(String),
    /// The file is not a valid configuration
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}
