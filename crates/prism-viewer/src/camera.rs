//! Trackball camera manipulator
//!
//! Orbits a [`Camera`] around its target with yaw/pitch angles, pans the
//! target in the view plane and zooms along the view direction.

use std::path::Path;

use glam::{Vec2, Vec3};
use prism_core::{BoundingBox, Ray};
use prism_renderer::config::CameraConfig;
use prism_renderer::{Camera, CameraState, DirectionalLight, RenderData};

use crate::error::{Result, ViewerError};

const MAX_PITCH_DEGREES: f32 = 89.0;
const MIN_DISTANCE: f32 = 0.1;
const MAX_DISTANCE: f32 = 10000.0;
/// Radians of rotation per dragged pixel
const ROTATE_SPEED: f32 = 0.01;

/// Drag in progress
#[derive(Debug, Clone, Copy, PartialEq)]
enum Drag {
    Rotate { last: Vec2 },
    Pan { last: Vec2 },
}

/// Camera driven by mouse drags and wheel
#[derive(Debug, Clone)]
pub struct TrackballCamera {
    camera: Camera,
    config: CameraConfig,
    yaw: f32,
    pitch: f32,
    distance: f32,
    drag: Option<Drag>,
    width: f32,
    height: f32,
}

impl TrackballCamera {
    /// Camera at the default pose for a viewport of `width` x `height` pixels
    pub fn new(config: CameraConfig, width: u32, height: u32) -> Self {
        let aspect = aspect_ratio(width, height);
        let mut trackball = Self {
            camera: Camera::from_config(&config, aspect),
            config,
            yaw: 0.0,
            pitch: 0.0,
            distance: 5.0,
            drag: None,
            width: width as f32,
            height: height as f32,
        };
        trackball.sync_orbit_from_camera();
        trackball
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Viewport size in pixels
    pub fn viewport(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width as f32;
        self.height = height as f32;
        self.camera.update_aspect(aspect_ratio(width, height));
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Start rotating around the target
    pub fn begin_rotate(&mut self, position: Vec2) {
        self.drag = Some(Drag::Rotate { last: position });
    }

    /// Start panning the target
    pub fn begin_pan(&mut self, position: Vec2) {
        self.drag = Some(Drag::Pan { last: position });
    }

    /// Continue the current drag; returns false when no drag is active
    pub fn drag_to(&mut self, position: Vec2) -> bool {
        match self.drag {
            Some(Drag::Rotate { last }) => {
                let delta = (position - last) * ROTATE_SPEED * self.config.rotate_sensitivity;
                self.orbit(-delta.x, delta.y);
                self.drag = Some(Drag::Rotate { last: position });
                true
            }
            Some(Drag::Pan { last }) => {
                let delta = (position - last) * self.config.pan_sensitivity;
                self.pan(delta.x, delta.y);
                self.drag = Some(Drag::Pan { last: position });
                true
            }
            None => false,
        }
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Orbit the camera around the target
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        let limit = MAX_PITCH_DEGREES.to_radians();
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-limit, limit);
        self.update_position_from_orbit();
    }

    /// Pan the camera (move target)
    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let forward = self.camera.forward();
        let right = self.camera.right();
        let up = right.cross(forward).normalize_or_zero();

        let scale = self.distance * 0.002;
        self.camera.target += right * (-delta_x * scale) + up * (delta_y * scale);
        self.update_position_from_orbit();
    }

    /// Zoom by wheel notches, positive moves closer
    pub fn zoom(&mut self, delta: f32) {
        let factor = 1.0 - delta * self.config.zoom_sensitivity;
        self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.update_position_from_orbit();
    }

    /// Frame `bbox`, keeping the current view direction
    pub fn fit_scene(&mut self, bbox: &BoundingBox) {
        if !bbox.is_valid() {
            return;
        }
        self.camera.fit_box(bbox);
        self.sync_orbit_from_camera();
        tracing::debug!(
            "Camera fitted to scene: target {:?}, distance {:.3}",
            self.camera.target,
            self.distance
        );
    }

    /// Back to the default pose
    pub fn reset(&mut self) {
        let aspect = self.camera.aspect;
        self.camera = Camera::from_config(&self.config, aspect);
        self.drag = None;
        self.sync_orbit_from_camera();
    }

    /// Write the camera pose as RON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            ron::ser::to_string_pretty(&self.camera.state(), ron::ser::PrettyConfig::default())
                .map_err(|e| ViewerError::Camera(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| ViewerError::Io(e.to_string()))
    }

    /// Restore a pose written by [`TrackballCamera::save`]
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ViewerError::Io(e.to_string()))?;
        let state: CameraState =
            ron::from_str(&content).map_err(|e| ViewerError::Camera(e.to_string()))?;
        self.camera.apply_state(&state);
        self.drag = None;
        self.sync_orbit_from_camera();
        Ok(())
    }

    /// Point the first light along the view direction
    pub fn update_headlight(&self, lights: &mut [DirectionalLight]) {
        if let Some(light) = lights.first_mut() {
            light.direction = self.camera.forward();
        }
    }

    /// Frame input for the renderer
    pub fn render_data(&self, dt: f32) -> RenderData {
        self.camera.render_data(dt)
    }

    /// World ray through a viewport pixel (top-left origin)
    pub fn ray(&self, position: Vec2) -> Ray {
        self.camera
            .screen_to_ray(position, self.width.max(1.0), self.height.max(1.0))
    }

    fn update_position_from_orbit(&mut self) {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.camera.position = self.camera.target + Vec3::new(x, y, z);
        self.camera.up = Vec3::Y;
    }

    fn sync_orbit_from_camera(&mut self) {
        let offset = self.camera.position - self.camera.target;
        self.distance = offset.length().clamp(MIN_DISTANCE, MAX_DISTANCE);
        let dir = offset.normalize_or(Vec3::Z);
        let limit = MAX_PITCH_DEGREES.to_radians();
        self.pitch = dir.y.clamp(-1.0, 1.0).asin().clamp(-limit, limit);
        self.yaw = dir.x.atan2(dir.z);
        self.update_position_from_orbit();
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    if width == 0 || height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}
