//! Transform gizmos
//!
//! A gizmo is a set of handle render objects in the UI layer. Picking a handle
//! selects its constraint (an axis); dragging then turns pointer rays into a
//! new transform for the target object.
//!
//! - [`TranslateGizmo`]: moves along one axis
//! - [`RotateGizmo`]: rotates around one axis
//! - [`GizmoManager`]: owns the gizmos and tracks the target and drag state

pub mod collision;
mod manager;
mod rotate;
mod translate;

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use prism_core::{Ray, TriangleMesh};
use prism_renderer::config::GizmoConfig;
use prism_renderer::{PickingGranularity, RenderLayer, RenderObject, RenderObjectId, RenderObjectManager};

pub use manager::{GizmoManager, GizmoMode};
pub use rotate::RotateGizmo;
pub use translate::TranslateGizmo;

/// World axes, in handle order
pub const AXES: [Vec3; 3] = [Vec3::X, Vec3::Y, Vec3::Z];

const HIGHLIGHT_COLOR: [f32; 4] = [1.0, 0.85, 0.1, 1.0];

/// Interactive transform handle set
pub trait Gizmo: Send {
    fn name(&self) -> &'static str;

    /// Render objects drawing the handles, one per axis
    fn handles(&self) -> &[RenderObjectId];

    /// Show or hide every handle
    fn show(&mut self, objects: &mut RenderObjectManager, visible: bool);

    /// Place the handles on `target`; `scale` is the handle size in world units
    fn update_transform(&mut self, objects: &mut RenderObjectManager, target: &Mat4, scale: f32);

    /// Select the axis drawn by `drawable`. Any other id (or `None`) clears the
    /// selection; returns true when an axis is selected.
    fn select_constraint(
        &mut self,
        objects: &mut RenderObjectManager,
        drawable: Option<RenderObjectId>,
    ) -> bool;

    /// Selected axis index
    fn constraint(&self) -> Option<usize>;

    /// Record the target pose and the pointer ray at the start of a drag
    fn set_initial_state(&mut self, ray: &Ray, target: &Mat4);

    /// Target transform for the current pointer ray; `stepped` snaps the motion.
    /// `None` when no drag is set up or the ray gives no usable answer.
    fn mouse_move(&mut self, ray: &Ray, stepped: bool) -> Option<Mat4>;

    /// Closest handle hit by `ray`
    fn hit_test(&self, ray: &Ray) -> Option<usize>;

    /// Highlight one handle (or none), leaving the selected one highlighted
    fn highlight(&mut self, objects: &mut RenderObjectManager, index: Option<usize>);
}

/// Handle objects shared by the gizmo implementations
#[derive(Debug)]
struct HandleSet {
    ids: Vec<RenderObjectId>,
    colors: Vec<[f32; 4]>,
    selected: Option<usize>,
    center: Vec3,
    scale: f32,
}

impl HandleSet {
    /// Register one hidden UI object per axis, `mesh` oriented along +Z
    fn new(
        objects: &mut RenderObjectManager,
        name: &str,
        mesh: TriangleMesh,
        config: &GizmoConfig,
    ) -> Self {
        let mesh = Arc::new(mesh);
        let mut ids = Vec::with_capacity(AXES.len());
        let mut colors = Vec::with_capacity(AXES.len());
        for (i, label) in ["x", "y", "z"].iter().enumerate() {
            let color = config.axis_color(i);
            let mut object = RenderObject::new(format!("gizmo.{name}.{label}"), mesh.clone())
                .with_layer(RenderLayer::Ui)
                .with_picking(PickingGranularity::Object)
                .with_color(color);
            object.visible = false;
            ids.push(objects.add(object));
            colors.push(color);
        }
        Self {
            ids,
            colors,
            selected: None,
            center: Vec3::ZERO,
            scale: 1.0,
        }
    }

    fn show(&self, objects: &mut RenderObjectManager, visible: bool) {
        for &id in &self.ids {
            if let Some(object) = objects.get_mut(id) {
                object.visible = visible;
            }
        }
    }

    /// Move every handle; `local(axis_index)` positions a unit handle
    fn place(
        &mut self,
        objects: &mut RenderObjectManager,
        target: &Mat4,
        scale: f32,
        local: impl Fn(usize) -> Mat4,
    ) {
        self.center = target.w_axis.truncate();
        self.scale = scale.max(1e-4);
        let frame = Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), Quat::IDENTITY, self.center);
        for (i, &id) in self.ids.iter().enumerate() {
            if let Some(object) = objects.get_mut(id) {
                object.transform = frame * local(i);
            }
        }
    }

    fn select(&mut self, objects: &mut RenderObjectManager, drawable: Option<RenderObjectId>) -> bool {
        self.selected = drawable.and_then(|id| self.ids.iter().position(|&h| h == id));
        self.highlight(objects, None);
        self.selected.is_some()
    }

    fn highlight(&self, objects: &mut RenderObjectManager, hovered: Option<usize>) {
        for (i, &id) in self.ids.iter().enumerate() {
            if let Some(object) = objects.get_mut(id) {
                let lit = self.selected == Some(i) || hovered == Some(i);
                object.color = if lit { HIGHLIGHT_COLOR } else { self.colors[i] };
            }
        }
    }

    /// Index of the smallest hit
    fn closest(hits: impl Iterator<Item = (usize, Option<f32>)>) -> Option<usize> {
        hits.filter_map(|(i, t)| t.map(|t| (i, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

/// Rotation taking the +Z axis of a handle mesh onto `axis`
fn orient_z_to(axis: Vec3) -> Quat {
    Quat::from_rotation_arc(Vec3::Z, axis)
}

/// Snap `value` to a multiple of `step`; a non-positive step leaves it as is
fn snap(value: f32, step: f32) -> f32 {
    if step > 0.0 {
        (value / step).round() * step
    } else {
        value
    }
}
