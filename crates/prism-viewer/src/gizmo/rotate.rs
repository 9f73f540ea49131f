//! Axis rotation gizmo

use glam::{Mat4, Quat, Vec3};
use prism_core::Ray;
use prism_core::primitive::generate_torus_mesh;
use prism_renderer::config::GizmoConfig;
use prism_renderer::{RenderObjectId, RenderObjectManager};

use super::collision::{ray_plane_intersection, ray_ring_intersection};
use super::{AXES, Gizmo, HandleSet, orient_z_to, snap};

/// Tube radius of a ring relative to its radius
const RING_TUBE: f32 = 0.02;
/// Hover tolerance around the ring, relative to its radius
const HIT_THICKNESS: f32 = 0.08;

#[derive(Debug, Clone, Copy)]
struct DragStart {
    /// Vector from the center to the first plane hit
    from: Vec3,
    target: Mat4,
}

/// Rotates the target around one world axis through its origin
#[derive(Debug)]
pub struct RotateGizmo {
    handles: HandleSet,
    step: f32,
    start: Option<DragStart>,
}

impl RotateGizmo {
    pub fn new(objects: &mut RenderObjectManager, config: &GizmoConfig) -> Self {
        let mesh = generate_torus_mesh(1.0, RING_TUBE);
        Self {
            handles: HandleSet::new(objects, "rotate", mesh, config),
            step: config.rotate_step_degrees.to_radians(),
            start: None,
        }
    }

    /// Signed angle from `from` to `to` around `axis`
    fn angle_around(axis: Vec3, from: Vec3, to: Vec3) -> f32 {
        axis.dot(from.cross(to)).atan2(from.dot(to))
    }
}

impl Gizmo for RotateGizmo {
    fn name(&self) -> &'static str {
        "Rotate"
    }

    fn handles(&self) -> &[RenderObjectId] {
        &self.handles.ids
    }

    fn show(&mut self, objects: &mut RenderObjectManager, visible: bool) {
        self.handles.show(objects, visible);
    }

    fn update_transform(&mut self, objects: &mut RenderObjectManager, target: &Mat4, scale: f32) {
        self.handles.place(objects, target, scale, |i| {
            Mat4::from_quat(orient_z_to(AXES[i]))
        });
    }

    fn select_constraint(
        &mut self,
        objects: &mut RenderObjectManager,
        drawable: Option<RenderObjectId>,
    ) -> bool {
        self.start = None;
        self.handles.select(objects, drawable)
    }

    fn constraint(&self) -> Option<usize> {
        self.handles.selected
    }

    fn set_initial_state(&mut self, ray: &Ray, target: &Mat4) {
        self.start = self.handles.selected.and_then(|axis| {
            let center = target.w_axis.truncate();
            let t = ray_plane_intersection(ray, center, AXES[axis])?;
            let from = ray.at(t) - center;
            (from.length_squared() > 1e-12).then_some(DragStart {
                from,
                target: *target,
            })
        });
    }

    fn mouse_move(&mut self, ray: &Ray, stepped: bool) -> Option<Mat4> {
        let axis = AXES[self.handles.selected?];
        let start = self.start?;
        let center = start.target.w_axis.truncate();
        let to = ray.at(ray_plane_intersection(ray, center, axis)?) - center;
        if to.length_squared() < 1e-12 {
            return None;
        }

        let mut angle = Self::angle_around(axis, start.from, to);
        if stepped {
            angle = snap(angle, self.step);
        }
        let rotation = Mat4::from_translation(center)
            * Mat4::from_quat(Quat::from_axis_angle(axis, angle))
            * Mat4::from_translation(-center);
        Some(rotation * start.target)
    }

    fn hit_test(&self, ray: &Ray) -> Option<usize> {
        let center = self.handles.center;
        let radius = self.handles.scale;
        HandleSet::closest(AXES.iter().enumerate().map(|(i, &axis)| {
            (
                i,
                ray_ring_intersection(ray, center, axis, radius, HIT_THICKNESS * radius),
            )
        }))
    }

    fn highlight(&mut self, objects: &mut RenderObjectManager, index: Option<usize>) {
        self.handles.highlight(objects, index);
    }
}
