//! Gizmo selection and drag state

use prism_core::Ray;
use prism_renderer::config::GizmoConfig;
use prism_renderer::{Camera, PickingResult, RenderObjectId, RenderObjectManager};

use super::{Gizmo, RotateGizmo, TranslateGizmo};

/// Which gizmo is shown on the target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GizmoMode {
    #[default]
    None,
    Translate,
    Rotate,
}

/// Owns the gizmos and drives the active one
pub struct GizmoManager {
    translate: TranslateGizmo,
    rotate: RotateGizmo,
    mode: GizmoMode,
    target: Option<RenderObjectId>,
    dragging: bool,
    hovered: Option<usize>,
    scale: f32,
}

impl GizmoManager {
    /// Register the handle objects of every gizmo (hidden) in `objects`
    pub fn new(objects: &mut RenderObjectManager, config: &GizmoConfig) -> Self {
        Self {
            translate: TranslateGizmo::new(objects, config),
            rotate: RotateGizmo::new(objects, config),
            mode: GizmoMode::Translate,
            target: None,
            dragging: false,
            hovered: None,
            scale: config.scale,
        }
    }

    pub fn mode(&self) -> GizmoMode {
        self.mode
    }

    pub fn set_mode(&mut self, objects: &mut RenderObjectManager, mode: GizmoMode) {
        if self.mode == mode {
            return;
        }
        self.cancel(objects);
        self.mode = mode;
        tracing::debug!("Gizmo mode: {:?}", mode);
    }

    /// Object the gizmo manipulates
    pub fn target(&self) -> Option<RenderObjectId> {
        self.target
    }

    /// Attach to `target` (or detach with `None`)
    pub fn attach(&mut self, objects: &mut RenderObjectManager, target: Option<RenderObjectId>) {
        if self.target == target {
            return;
        }
        self.cancel(objects);
        self.target = target;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// True when `id` draws a handle of any gizmo
    pub fn is_gizmo_object(&self, id: RenderObjectId) -> bool {
        self.translate.handles().contains(&id) || self.rotate.handles().contains(&id)
    }

    fn active(&mut self) -> Option<&mut dyn Gizmo> {
        match self.mode {
            GizmoMode::None => None,
            GizmoMode::Translate => Some(&mut self.translate),
            GizmoMode::Rotate => Some(&mut self.rotate),
        }
    }

    /// Place the active gizmo on the target and hide the others.
    ///
    /// Handles keep a constant size on screen by scaling with the camera
    /// distance.
    pub fn update(&mut self, objects: &mut RenderObjectManager, camera: &Camera) {
        let transform = self
            .target
            .and_then(|id| objects.get(id))
            .map(|object| object.transform);
        if transform.is_none() && self.target.is_some() {
            tracing::debug!("Gizmo target vanished, detaching");
            self.target = None;
            self.dragging = false;
        }

        let mode = self.mode;
        let scale = self.scale;
        self.translate
            .show(objects, transform.is_some() && mode == GizmoMode::Translate);
        self.rotate
            .show(objects, transform.is_some() && mode == GizmoMode::Rotate);

        if let (Some(transform), Some(gizmo)) = (transform, self.active()) {
            let distance = camera.position.distance(transform.w_axis.truncate());
            gizmo.update_transform(objects, &transform, scale * distance.max(1e-3));
        }
    }

    /// Select a constraint if `result` hit a handle of the active gizmo
    pub fn handle_picking(
        &mut self,
        objects: &mut RenderObjectManager,
        result: &PickingResult,
    ) -> bool {
        if self.target.is_none() {
            return false;
        }
        let Some(id) = result.object() else {
            return false;
        };
        let Some(gizmo) = self.active() else {
            return false;
        };
        if !gizmo.handles().contains(&id) {
            return false;
        }
        gizmo.select_constraint(objects, Some(id))
    }

    /// Start dragging the selected constraint from the pointer ray
    pub fn begin_drag(&mut self, objects: &RenderObjectManager, ray: &Ray) -> bool {
        let Some(transform) = self.target.and_then(|id| objects.get(id)).map(|o| o.transform)
        else {
            return false;
        };
        let Some(gizmo) = self.active() else {
            return false;
        };
        if gizmo.constraint().is_none() {
            return false;
        }
        gizmo.set_initial_state(ray, &transform);
        self.dragging = true;
        true
    }

    /// Move the target to follow the pointer ray; returns true when it moved
    pub fn drag(&mut self, objects: &mut RenderObjectManager, ray: &Ray, stepped: bool) -> bool {
        if !self.dragging {
            return false;
        }
        let Some(target) = self.target else {
            return false;
        };
        let Some(transform) = self.active().and_then(|g| g.mouse_move(ray, stepped)) else {
            return false;
        };
        match objects.get_mut(target) {
            Some(object) => {
                object.transform = transform;
                true
            }
            None => false,
        }
    }

    /// Finish the drag and release the constraint
    pub fn end_drag(&mut self, objects: &mut RenderObjectManager) {
        if self.dragging {
            self.dragging = false;
            if let Some(gizmo) = self.active() {
                gizmo.select_constraint(objects, None);
            }
        }
    }

    /// Highlight the handle under the pointer; returns its axis index
    pub fn hover(&mut self, objects: &mut RenderObjectManager, ray: &Ray) -> Option<usize> {
        if self.dragging || self.target.is_none() {
            return None;
        }
        let hovered = self.active().and_then(|g| g.hit_test(ray));
        if hovered != self.hovered {
            self.hovered = hovered;
            if let Some(gizmo) = self.active() {
                gizmo.highlight(objects, hovered);
            }
        }
        hovered
    }

    fn cancel(&mut self, objects: &mut RenderObjectManager) {
        self.dragging = false;
        self.hovered = None;
        self.translate.select_constraint(objects, None);
        self.rotate.select_constraint(objects, None);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use approx::assert_relative_eq;
    use glam::{Mat4, Vec3};
    use prism_core::primitive::generate_box_mesh;
    use prism_renderer::{PickingMode, RenderObject};

    fn scene() -> (RenderObjectManager, GizmoManager, RenderObjectId) {
        let mut objects = RenderObjectManager::new();
        let target = objects.add(RenderObject::new(
            "cube",
            Arc::new(generate_box_mesh([1.0, 1.0, 1.0])),
        ));
        let manager = GizmoManager::new(&mut objects, &GizmoConfig::default());
        (objects, manager, target)
    }

    fn hit(id: RenderObjectId) -> PickingResult {
        let mut result = PickingResult::none(PickingMode::Ro);
        result.ro_idx = id.pick_index();
        result
    }

    #[test]
    fn test_update_shows_active_gizmo_on_target() {
        let (mut objects, mut manager, target) = scene();
        let camera = Camera::new(1.0);

        manager.update(&mut objects, &camera);
        assert!(objects.iter().filter(|(_, o)| o.visible).count() == 1);

        manager.attach(&mut objects, Some(target));
        manager.update(&mut objects, &camera);
        let visible: Vec<_> = objects
            .iter()
            .filter(|(id, o)| o.visible && manager.is_gizmo_object(*id))
            .map(|(id, _)| id)
            .collect();
        assert_eq!(visible, manager.translate.handles().to_vec());

        manager.set_mode(&mut objects, GizmoMode::Rotate);
        manager.update(&mut objects, &camera);
        assert!(manager.rotate.handles().iter().all(|&id| objects.get(id).unwrap().visible));
        assert!(manager.translate.handles().iter().all(|&id| !objects.get(id).unwrap().visible));
    }

    #[test]
    fn test_pick_then_drag_moves_target() {
        let (mut objects, mut manager, target) = scene();
        let camera = Camera::new(1.0);
        manager.attach(&mut objects, Some(target));
        manager.update(&mut objects, &camera);

        assert!(!manager.handle_picking(&mut objects, &hit(target)));
        let x_handle = manager.translate.handles()[0];
        assert!(manager.handle_picking(&mut objects, &hit(x_handle)));

        assert!(manager.begin_drag(&objects, &Ray::new(Vec3::new(0.1, 0.0, 5.0), Vec3::NEG_Z)));
        assert!(manager.drag(
            &mut objects,
            &Ray::new(Vec3::new(0.6, 0.3, 5.0), Vec3::NEG_Z),
            false
        ));
        assert_relative_eq!(objects.get(target).unwrap().transform.w_axis.x, 0.5, epsilon = 1e-5);

        manager.end_drag(&mut objects);
        assert!(!manager.is_dragging());
        assert!(!manager.begin_drag(&objects, &Ray::new(Vec3::ZERO, Vec3::NEG_Z)));
    }

    #[test]
    fn test_removed_target_detaches() {
        let (mut objects, mut manager, target) = scene();
        manager.attach(&mut objects, Some(target));
        objects.remove(target);
        manager.update(&mut objects, &Camera::new(1.0));
        assert_eq!(manager.target(), None);
        assert!(objects.iter().all(|(_, o)| !o.visible));
    }

    #[test]
    fn test_hover_highlights() {
        let (mut objects, mut manager, target) = scene();
        let mut camera = Camera::new(1.0);
        camera.position = Vec3::new(0.0, 0.0, 10.0);
        objects.get_mut(target).unwrap().transform = Mat4::IDENTITY;
        manager.attach(&mut objects, Some(target));
        manager.update(&mut objects, &camera);

        // Handles are 0.15 * 10 = 1.5 units long
        let over_x = Ray::new(Vec3::new(1.0, 0.0, 10.0), Vec3::NEG_Z);
        assert_eq!(manager.hover(&mut objects, &over_x), Some(0));
        let off = Ray::new(Vec3::new(5.0, 5.0, 10.0), Vec3::NEG_Z);
        assert_eq!(manager.hover(&mut objects, &off), None);
    }
}
