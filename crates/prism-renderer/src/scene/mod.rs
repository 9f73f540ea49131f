//! Render objects and the scene registry
//!
//! A [`Scene`] owns every [`RenderObject`] through its [`RenderObjectManager`]
//! and the lights used for shading. It is passed by reference into each frame;
//! there is no global engine state.

mod manager;

use std::fmt;
use std::sync::Arc;

use glam::Mat4;
use prism_core::{BoundingBox, TriangleMesh};

use crate::frame::RenderData;
use crate::light::DirectionalLight;

pub use manager::RenderObjectManager;

/// Render queue class an object is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderLayer {
    /// Lit, opaque scene content.
    Fancy,
    /// Helpers drawn on top of the post-processed image, depth tested.
    Debug,
    /// Drawn translucent through everything else.
    XRay,
    /// Handles and widgets, always on top.
    Ui,
}

impl RenderLayer {
    /// All layers in draw order.
    pub const ALL: [RenderLayer; 4] = [
        RenderLayer::Fancy,
        RenderLayer::Debug,
        RenderLayer::XRay,
        RenderLayer::Ui,
    ];

    /// Position in [`RenderLayer::ALL`].
    pub fn index(&self) -> usize {
        match self {
            RenderLayer::Fancy => 0,
            RenderLayer::Debug => 1,
            RenderLayer::XRay => 2,
            RenderLayer::Ui => 3,
        }
    }
}

/// What a pick on an object reports besides the object itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PickingGranularity {
    /// Only the object.
    #[default]
    Object,
    /// Nearest vertex.
    Vertex,
    /// Nearest edge of the hit triangle.
    Edge,
    /// Hit triangle.
    Triangle,
}

impl PickingGranularity {
    /// All granularities in draw order.
    pub const ALL: [PickingGranularity; 4] = [
        PickingGranularity::Object,
        PickingGranularity::Vertex,
        PickingGranularity::Edge,
        PickingGranularity::Triangle,
    ];

    /// Position in [`PickingGranularity::ALL`].
    pub fn index(&self) -> usize {
        match self {
            PickingGranularity::Object => 0,
            PickingGranularity::Vertex => 1,
            PickingGranularity::Edge => 2,
            PickingGranularity::Triangle => 3,
        }
    }
}

/// Stable handle of a registered render object.
///
/// Ids are allocated monotonically and never reused, so a handle to a removed
/// object just fails to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderObjectId(pub u32);

impl RenderObjectId {
    /// Value written to the picking buffer for this object.
    pub fn pick_index(&self) -> i32 {
        self.0 as i32
    }

    /// Inverse of [`Self::pick_index`]; negative values mean "nothing".
    pub fn from_pick_index(index: i32) -> Option<Self> {
        u32::try_from(index).ok().map(RenderObjectId)
    }
}

impl fmt::Display for RenderObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-frame behavior attached to a render object.
pub trait UpdateHook: Send {
    /// Called once per frame during the update stage.
    fn update(&mut self, transform: &mut Mat4, data: &RenderData);
}

impl<F> UpdateHook for F
where
    F: FnMut(&mut Mat4, &RenderData) + Send,
{
    fn update(&mut self, transform: &mut Mat4, data: &RenderData) {
        self(transform, data)
    }
}

/// A drawable mesh instance.
pub struct RenderObject {
    /// Display name.
    pub name: String,
    /// Queue class.
    pub layer: RenderLayer,
    /// Picking granularity; `None` picks the whole object.
    pub picking: Option<PickingGranularity>,
    /// Geometry, shared between objects.
    pub mesh: Arc<TriangleMesh>,
    /// Model to world transform.
    pub transform: Mat4,
    /// Base color (RGBA).
    pub color: [f32; 4],
    /// Hidden objects are neither drawn nor picked.
    pub visible: bool,
    update: Option<Box<dyn UpdateHook>>,
}

impl RenderObject {
    /// Creates a visible object in the [`RenderLayer::Fancy`] layer.
    pub fn new(name: impl Into<String>, mesh: Arc<TriangleMesh>) -> Self {
        Self {
            name: name.into(),
            layer: RenderLayer::Fancy,
            picking: None,
            mesh,
            transform: Mat4::IDENTITY,
            color: [0.7, 0.7, 0.7, 1.0],
            visible: true,
            update: None,
        }
    }

    /// Sets the layer.
    pub fn with_layer(mut self, layer: RenderLayer) -> Self {
        self.layer = layer;
        self
    }

    /// Sets the picking granularity.
    pub fn with_picking(mut self, granularity: PickingGranularity) -> Self {
        self.picking = Some(granularity);
        self
    }

    /// Sets the model transform.
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Sets the color.
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    /// Attaches a per-frame update hook.
    pub fn with_update(mut self, hook: impl UpdateHook + 'static) -> Self {
        self.update = Some(Box::new(hook));
        self
    }

    /// Effective picking granularity.
    pub fn granularity(&self) -> PickingGranularity {
        self.picking.unwrap_or_default()
    }

    /// World-space bounds.
    pub fn world_bounds(&self) -> BoundingBox {
        self.mesh.bounding_box().transform(&self.transform)
    }

    pub(crate) fn run_update(&mut self, data: &RenderData) {
        if let Some(hook) = self.update.as_mut() {
            hook.update(&mut self.transform, data);
        }
    }
}

impl fmt::Debug for RenderObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderObject")
            .field("name", &self.name)
            .field("layer", &self.layer)
            .field("picking", &self.picking)
            .field("triangles", &self.mesh.triangle_count())
            .field("visible", &self.visible)
            .field("has_update", &self.update.is_some())
            .finish()
    }
}

/// Objects and lights of one viewer.
#[derive(Debug)]
pub struct Scene {
    /// Render object registry.
    pub objects: RenderObjectManager,
    /// Lights used by lit draws; the first one may follow the camera.
    pub lights: Vec<DirectionalLight>,
}

impl Scene {
    /// Empty scene with one default light.
    pub fn new() -> Self {
        Self {
            objects: RenderObjectManager::new(),
            lights: vec![DirectionalLight::default()],
        }
    }

    /// Bounds of every visible object in the given layers.
    pub fn bounding_box(&self, layers: &[RenderLayer]) -> BoundingBox {
        self.objects
            .iter()
            .filter(|(_, o)| o.visible && layers.contains(&o.layer) && !o.mesh.is_empty())
            .fold(BoundingBox::empty(), |acc, (_, o)| acc.union(&o.world_bounds()))
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
