//! Screen-space picking
//!
//! Queries are answered from an off-screen buffer in which every covered pixel
//! holds a [`PickTexel`]: the object index plus, depending on the object's
//! [`crate::scene::PickingGranularity`], its nearest vertex, triangle and edge.
//!
//! - [`PickBuffer`]: read-back picking buffer
//! - [`resolve_query`]: turns one query into a [`PickingResult`]
//! - [`pass`]: draws the picking buffer for a frame

mod buffer;
pub mod pass;
mod resolve;

use glam::Vec2;
use prism_core::MouseButton;

pub use buffer::{PickBuffer, PickTexel};
pub use resolve::resolve_query;

/// What a query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickingMode {
    /// Render object under the pixel.
    Ro,
    /// Vertex under the pixel.
    Vertex,
    /// Edge under the pixel.
    Edge,
    /// Triangle under the pixel.
    Triangle,
    /// Vertices inside the brush circle.
    CVertex,
    /// Edges inside the brush circle.
    CEdge,
    /// Triangles inside the brush circle.
    CTriangle,
}

impl PickingMode {
    /// True for brush (circle) modes.
    pub fn is_circle(&self) -> bool {
        matches!(
            self,
            PickingMode::CVertex | PickingMode::CEdge | PickingMode::CTriangle
        )
    }

    /// Brush variant of a feature mode; `Ro` has none and is returned as is.
    pub fn to_circle(self) -> Self {
        match self {
            PickingMode::Vertex => PickingMode::CVertex,
            PickingMode::Edge => PickingMode::CEdge,
            PickingMode::Triangle => PickingMode::CTriangle,
            other => other,
        }
    }
}

/// A pick request at a pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickingQuery {
    /// Pixel position, origin at the bottom-left corner of the viewport.
    pub screen: Vec2,
    /// Button that triggered the pick.
    pub button: MouseButton,
    /// What to report.
    pub mode: PickingMode,
}

impl PickingQuery {
    /// Creates a query.
    pub fn new(screen: Vec2, button: MouseButton, mode: PickingMode) -> Self {
        Self {
            screen,
            button,
            mode,
        }
    }
}

/// Answer to one [`PickingQuery`].
///
/// `vertex_idx`, `element_idx`, `edge_idx` and `weights` are parallel lists:
/// entry `i` of each describes the same picked feature.
#[derive(Debug, Clone, PartialEq)]
pub struct PickingResult {
    /// Mode of the query.
    pub mode: PickingMode,
    /// Picked render object index, `-1` when nothing was hit.
    pub ro_idx: i32,
    /// Nearest vertex of each feature (`-1` when not applicable).
    pub vertex_idx: Vec<i32>,
    /// Triangle of each feature (`-1` when not applicable).
    pub element_idx: Vec<i32>,
    /// Vertex opposite the picked edge in its triangle (`-1` when not applicable).
    pub edge_idx: Vec<i32>,
    /// Weight of each feature in (0, 1], decreasing.
    pub weights: Vec<f32>,
}

impl PickingResult {
    /// Result for a query that hit nothing.
    pub fn none(mode: PickingMode) -> Self {
        Self {
            mode,
            ro_idx: -1,
            vertex_idx: Vec::new(),
            element_idx: Vec::new(),
            edge_idx: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// True when an object was hit.
    pub fn is_hit(&self) -> bool {
        self.ro_idx >= 0
    }

    /// Picked object id.
    pub fn object(&self) -> Option<crate::scene::RenderObjectId> {
        crate::scene::RenderObjectId::from_pick_index(self.ro_idx)
    }

    /// Number of picked features.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// True when no feature was picked.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub(crate) fn push(&mut self, texel: &PickTexel, weight: f32) {
        self.vertex_idx.push(texel.vertex);
        self.element_idx.push(texel.element);
        self.edge_idx.push(texel.edge);
        self.weights.push(weight);
    }
}
