//! Directional lights owned by the scene

use glam::Vec3;

use crate::config::LightingConfig;

/// A light at infinity shining along `direction`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels (normalized)
    pub direction: Vec3,
    /// Linear RGB color
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
    /// Ambient term added to every lit surface
    pub ambient: f32,
}

impl DirectionalLight {
    /// Create a light with the default ambient term
    pub fn new(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            color,
            intensity,
            ambient: 0.3,
        }
    }

    /// Create a light with color, intensity and ambient from `config`
    pub fn from_config(config: &LightingConfig, direction: Vec3) -> Self {
        Self {
            ambient: config.ambient_strength,
            ..Self::new(direction, Vec3::from(config.color), config.intensity)
        }
    }

    /// Diffuse factor for a surface normal, ambient included
    pub fn shade(&self, normal: Vec3) -> Vec3 {
        let diffuse = normal.dot(-self.direction).abs();
        self.color * (self.ambient + diffuse * self.intensity * (1.0 - self.ambient))
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::from_config(&LightingConfig::default(), Vec3::new(-0.3, -0.4, -1.0))
    }
}
