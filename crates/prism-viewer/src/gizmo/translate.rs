//! Axis translation gizmo

use glam::Mat4;
use prism_core::Ray;
use prism_core::primitive::generate_cylinder_mesh;
use prism_renderer::config::GizmoConfig;
use prism_renderer::{RenderObjectId, RenderObjectManager};

use super::collision::{closest_point_on_axis, ray_cylinder_intersection};
use super::{AXES, Gizmo, HandleSet, orient_z_to, snap};

/// Arrow shaft radius relative to the handle length
const SHAFT_RADIUS: f32 = 0.03;
/// Hover tolerance around the shaft, relative to the handle length
const HIT_RADIUS: f32 = 0.08;

#[derive(Debug, Clone, Copy)]
struct DragStart {
    axis_param: f32,
    target: Mat4,
}

/// Moves the target along one world axis
#[derive(Debug)]
pub struct TranslateGizmo {
    handles: HandleSet,
    step: f32,
    start: Option<DragStart>,
}

impl TranslateGizmo {
    pub fn new(objects: &mut RenderObjectManager, config: &GizmoConfig) -> Self {
        let mesh = generate_cylinder_mesh(SHAFT_RADIUS, 1.0);
        Self {
            handles: HandleSet::new(objects, "translate", mesh, config),
            step: config.translate_step,
            start: None,
        }
    }
}

impl Gizmo for TranslateGizmo {
    fn name(&self) -> &'static str {
        "Translate"
    }

    fn handles(&self) -> &[RenderObjectId] {
        &self.handles.ids
    }

    fn show(&mut self, objects: &mut RenderObjectManager, visible: bool) {
        self.handles.show(objects, visible);
    }

    fn update_transform(&mut self, objects: &mut RenderObjectManager, target: &Mat4, scale: f32) {
        // Unit shaft centered on the origin, moved to span [0, 1] along its axis
        self.handles.place(objects, target, scale, |i| {
            Mat4::from_rotation_translation(orient_z_to(AXES[i]), AXES[i] * 0.5)
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
            closest_point_on_axis(ray, center, AXES[axis]).map(|axis_param| DragStart {
                axis_param,
                target: *target,
            })
        });
    }

    fn mouse_move(&mut self, ray: &Ray, stepped: bool) -> Option<Mat4> {
        let axis = AXES[self.handles.selected?];
        let start = self.start?;
        let center = start.target.w_axis.truncate();
        let param = closest_point_on_axis(ray, center, axis)?;

        let mut delta = param - start.axis_param;
        if stepped {
            delta = snap(delta, self.step);
        }
        Some(Mat4::from_translation(axis * delta) * start.target)
    }

    fn hit_test(&self, ray: &Ray) -> Option<usize> {
        let center = self.handles.center;
        let length = self.handles.scale;
        HandleSet::closest(AXES.iter().enumerate().map(|(i, &axis)| {
            (
                i,
                ray_cylinder_intersection(ray, center, center + axis * length, HIT_RADIUS * length),
            )
        }))
    }

    fn highlight(&mut self, objects: &mut RenderObjectManager, index: Option<usize>) {
        self.handles.highlight(objects, index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec3;

    fn setup() -> (RenderObjectManager, TranslateGizmo) {
        let mut objects = RenderObjectManager::new();
        let gizmo = TranslateGizmo::new(&mut objects, &GizmoConfig::default());
        (objects, gizmo)
    }

    #[test]
    fn test_handles_start_hidden_in_ui_layer() {
        let (objects, gizmo) = setup();
        assert_eq!(gizmo.handles().len(), 3);
        for &id in gizmo.handles() {
            let object = objects.get(id).unwrap();
            assert!(!object.visible);
            assert_eq!(object.layer, prism_renderer::RenderLayer::Ui);
        }
    }

    #[test]
    fn test_select_constraint_highlights_handle() {
        let (mut objects, mut gizmo) = setup();
        let y = gizmo.handles()[1];
        assert!(gizmo.select_constraint(&mut objects, Some(y)));
        assert_eq!(gizmo.constraint(), Some(1));
        assert_eq!(objects.get(y).unwrap().color, super::super::HIGHLIGHT_COLOR);

        assert!(!gizmo.select_constraint(&mut objects, Some(RenderObjectId(999))));
        assert_eq!(gizmo.constraint(), None);
        assert_ne!(objects.get(y).unwrap().color, super::super::HIGHLIGHT_COLOR);
    }

    #[test]
    fn test_drag_along_x() {
        let (mut objects, mut gizmo) = setup();
        let target = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        gizmo.update_transform(&mut objects, &target, 1.0);
        gizmo.select_constraint(&mut objects, Some(gizmo.handles()[0]));

        gizmo.set_initial_state(&Ray::new(Vec3::new(1.2, 0.0, 5.0), Vec3::NEG_Z), &target);
        let moved = gizmo
            .mouse_move(&Ray::new(Vec3::new(1.57, 2.0, 5.0), Vec3::NEG_Z), false)
            .unwrap();
        assert_relative_eq!(moved.w_axis.x, 1.37, epsilon = 1e-5);
        assert_relative_eq!(moved.w_axis.y, 0.0, epsilon = 1e-5);

        let stepped = gizmo
            .mouse_move(&Ray::new(Vec3::new(1.57, 2.0, 5.0), Vec3::NEG_Z), true)
            .unwrap();
        assert_relative_eq!(stepped.w_axis.x, 1.4, epsilon = 1e-5);
    }

    #[test]
    fn test_mouse_move_without_constraint() {
        let (_, mut gizmo) = setup();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        gizmo.set_initial_state(&ray, &Mat4::IDENTITY);
        assert!(gizmo.mouse_move(&ray, false).is_none());
    }

    #[test]
    fn test_hit_test_finds_axis() {
        let (mut objects, mut gizmo) = setup();
        gizmo.update_transform(&mut objects, &Mat4::IDENTITY, 2.0);
        let over_y = Ray::new(Vec3::new(0.0, 1.5, 5.0), Vec3::NEG_Z);
        assert_eq!(gizmo.hit_test(&over_y), Some(1));
        let away = Ray::new(Vec3::new(3.0, 3.0, 5.0), Vec3::NEG_Z);
        assert_eq!(gizmo.hit_test(&away), None);
    }
}
