//! Perspective camera for the 3D viewport

use glam::{Mat4, Vec2, Vec3, Vec4};
use prism_core::{BoundingBox, Ray};
use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;
use crate::frame::RenderData;

/// Perspective camera looking at a target point
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Eye position
    pub position: Vec3,
    /// Point the camera looks at
    pub target: Vec3,
    /// Up direction
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov: f32,
    /// Width over height
    pub aspect: f32,
    /// Near clipping plane distance
    pub near: f32,
    /// Far clipping plane distance
    pub far: f32,
}

/// Serializable camera pose and lens, used to save and restore views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct CameraState {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Create a camera with default parameters, looking at the origin from +Z
    pub fn new(aspect: f32) -> Self {
        Self::from_config(&CameraConfig::default(), aspect)
    }

    /// Create a camera using the lens settings of `config`
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: config.fov_degrees.to_radians(),
            aspect,
            near: config.near_plane,
            far: config.far_plane,
        }
    }

    /// Update aspect ratio
    pub fn update_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Set field of view in degrees
    pub fn set_fov_degrees(&mut self, fov_degrees: f32) {
        self.fov = fov_degrees.clamp(10.0, 120.0).to_radians();
    }

    /// Get field of view in degrees
    pub fn fov_degrees(&self) -> f32 {
        self.fov.to_degrees()
    }

    /// Distance from the eye to the target
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// Unit vector from the eye towards the target
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Unit vector pointing to the right of the view
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    /// Move the eye back along the view direction until `bbox` fits the view
    pub fn fit_box(&mut self, bbox: &BoundingBox) {
        if !bbox.is_valid() {
            return;
        }
        let radius = bbox.radius().max(1e-3);
        let half_fov = (self.fov * 0.5).min(self.fov * 0.5 * self.aspect.min(1.0));
        let distance = radius / half_fov.sin();
        let forward = match self.forward() {
            f if f == Vec3::ZERO => Vec3::NEG_Z,
            f => f,
        };
        self.target = bbox.center();
        self.position = self.target - forward * distance;
        self.near = (distance - radius).max(distance * 1e-3);
        self.far = self.far.max(distance + radius * 2.0);
    }

    /// Get view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Get projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    /// Frame input for the renderer
    pub fn render_data(&self, dt: f32) -> RenderData {
        RenderData::new(self.view_matrix(), self.projection_matrix(), dt)
    }

    /// World ray through a screen point given in pixels from the top-left corner
    pub fn screen_to_ray(&self, screen: Vec2, screen_width: f32, screen_height: f32) -> Ray {
        let ndc_x = 2.0 * screen.x / screen_width - 1.0;
        let ndc_y = 1.0 - 2.0 * screen.y / screen_height;

        let inv_view_proj = (self.projection_matrix() * self.view_matrix()).inverse();
        let unproject = |z: f32| {
            let p = inv_view_proj * Vec4::new(ndc_x, ndc_y, z, 1.0);
            p.truncate() / p.w
        };

        // wgpu clip space: depth 0 at the near plane, 1 at the far plane
        let near = unproject(0.0);
        let far = unproject(1.0);
        Ray::new(near, far - near)
    }

    /// Snapshot of the pose and lens
    pub fn state(&self) -> CameraState {
        CameraState {
            position: self.position,
            target: self.target,
            up: self.up,
            fov_degrees: self.fov_degrees(),
            near: self.near,
            far: self.far,
        }
    }

    /// Restore a snapshot, keeping the current aspect ratio
    pub fn apply_state(&mut self, state: &CameraState) {
        self.position = state.position;
        self.target = state.target;
        self.up = state.up.normalize_or_zero();
        self.set_fov_degrees(state.fov_degrees);
        self.near = state.near.max(1e-4);
        self.far = state.far.max(self.near + 1e-3);
    }
}
