//! Render devices
//!
//! [`RenderDevice`] is the seam between the frame orchestrator and the GPU.
//! Everything the orchestrator, the strategies and the picking pass draw goes
//! through it.
//!
//! - [`gpu::WgpuDevice`]: hardware device (WGSL shaders, texture readback)
//! - [`software::SoftwareDevice`]: CPU rasterizer with the same encoding rules,
//!   for headless use and tests

pub mod gpu;
pub mod software;

use std::sync::Arc;

use glam::{Mat4, Vec3};
use prism_core::TriangleMesh;

use crate::error::RenderError;
use crate::frame::RenderData;
use crate::light::DirectionalLight;
use crate::picking::PickBuffer;
use crate::queue::RenderQueue;
use crate::scene::{PickingGranularity, RenderObjectId, RenderObjectManager};

pub use self::gpu::WgpuDevice;
pub use self::software::SoftwareDevice;

/// Handle of a screen-sized color texture owned by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Where the composited frame goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    /// The device's own presentation texture.
    Backbuffer,
    /// A target bound by the host (e.g. a UI toolkit texture).
    External,
}

/// How a draw shades its fragments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawStyle {
    /// Diffuse lighting from the frame light.
    Lit,
    /// Unlit base color.
    Flat,
    /// Triangle edges only.
    Wireframe,
    /// Blended over the target with the given opacity.
    XRay(f32),
}

/// Full-screen pass applied by [`RenderDevice::blit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostEffect {
    /// Plain copy.
    Copy,
    /// Exposure and gamma tonemapping.
    Tonemap {
        /// Exposure multiplier.
        exposure: f32,
        /// Output gamma.
        gamma: f32,
    },
}

/// Camera and light shared by every draw of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParams {
    /// World to view.
    pub view: Mat4,
    /// View to clip.
    pub projection: Mat4,
    /// Camera position.
    pub eye: Vec3,
    /// Shading light.
    pub light: DirectionalLight,
}

impl ViewParams {
    /// Build from frame data; the first light shades, a default one otherwise.
    pub fn new(data: &RenderData, lights: &[DirectionalLight]) -> Self {
        Self {
            view: data.view,
            projection: data.projection,
            eye: data.eye(),
            light: lights.first().copied().unwrap_or_default(),
        }
    }

    /// Clip-space transform.
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// One object instance to draw.
#[derive(Debug, Clone)]
pub struct DrawItem {
    /// Object id, also its pick index.
    pub id: RenderObjectId,
    /// Geometry.
    pub mesh: Arc<TriangleMesh>,
    /// Model to world.
    pub transform: Mat4,
    /// Base color (RGBA).
    pub color: [f32; 4],
}

impl DrawItem {
    /// Items for every id of `queue` that still resolves.
    pub fn collect(queue: &RenderQueue, objects: &RenderObjectManager) -> Vec<DrawItem> {
        queue
            .iter()
            .filter_map(|&id| {
                objects.get(id).map(|o| DrawItem {
                    id,
                    mesh: o.mesh.clone(),
                    transform: o.transform,
                    color: o.color,
                })
            })
            .collect()
    }
}

/// RGBA8 image with rows ordered top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

impl FrameImage {
    /// RGBA of pixel `(x, y)` from the top-left corner.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]]
    }
}

/// GPU abstraction used by the renderer.
///
/// Color textures created with [`RenderDevice::create_texture`] and the picking
/// target always match [`RenderDevice::size`]; [`RenderDevice::resize`]
/// reallocates them while keeping their ids valid. All color draws share one
/// depth buffer.
pub trait RenderDevice: Send {
    /// Backend name for logs.
    fn backend_name(&self) -> &str;

    /// Current viewport size in pixels.
    fn size(&self) -> (u32, u32);

    /// Reallocate every screen-sized resource.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError>;

    /// Allocate a screen-sized RGBA texture.
    fn create_texture(&mut self, label: &str) -> Result<TextureId, RenderError>;

    /// Output target currently bound by the host.
    fn bound_target(&self) -> OutputTarget;

    /// Start recording a frame.
    fn begin_frame(&mut self, view: &ViewParams) -> Result<(), RenderError>;

    /// Clear a texture to `color` and reset the shared depth buffer.
    fn clear(&mut self, target: TextureId, color: [f32; 4]) -> Result<(), RenderError>;

    /// Reset the shared depth buffer only.
    fn clear_depth(&mut self) -> Result<(), RenderError>;

    /// Draw items into `target` with depth testing.
    fn draw(
        &mut self,
        target: TextureId,
        style: DrawStyle,
        items: &[DrawItem],
    ) -> Result<(), RenderError>;

    /// Reset the picking target to background and its depth to far.
    fn clear_picking(&mut self) -> Result<(), RenderError>;

    /// Reset the picking depth only.
    fn clear_picking_depth(&mut self) -> Result<(), RenderError>;

    /// Draw items into the picking target with the encoding of `granularity`.
    fn draw_picking(
        &mut self,
        granularity: PickingGranularity,
        items: &[DrawItem],
    ) -> Result<(), RenderError>;

    /// Read the picking target back.
    fn read_picking(&mut self) -> Result<PickBuffer, RenderError>;

    /// Full-screen pass from `src` to `dst`.
    fn blit(&mut self, src: TextureId, dst: TextureId, effect: PostEffect)
    -> Result<(), RenderError>;

    /// Copy `src` to an output target.
    fn composite(&mut self, src: TextureId, target: OutputTarget) -> Result<(), RenderError>;

    /// Finish and submit the frame.
    fn end_frame(&mut self) -> Result<(), RenderError>;

    /// Read a texture back.
    fn read_texture(&mut self, texture: TextureId) -> Result<FrameImage, RenderError>;

    /// Reload shaders. On failure the previous shaders stay in use.
    fn reload_shaders(&mut self) -> Result<(), RenderError>;
}
