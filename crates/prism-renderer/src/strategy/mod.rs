//! Rendering strategies
//!
//! A [`RenderStrategy`] owns the textures and passes of one rendering
//! technique. The [`crate::Renderer`] drives it through the frame stages and
//! composites whatever texture is on display.

mod forward;

pub use forward::ForwardStrategy;

use crate::config::RendererConfig;
use crate::device::{RenderDevice, TextureId};
use crate::error::RenderError;
use crate::frame::RenderData;
use crate::queue::RenderQueues;
use crate::scene::RenderObjectManager;
use crate::textures::TextureRegistry;

/// Everything a strategy step may touch during a frame.
pub struct FrameContext<'a> {
    /// Device to draw with.
    pub device: &'a mut dyn RenderDevice,
    /// Queues fed for this frame.
    pub queues: &'a RenderQueues,
    /// Objects the queues refer to.
    pub objects: &'a RenderObjectManager,
    /// Textures registered by the strategy.
    pub textures: &'a TextureRegistry,
    /// Current renderer settings.
    pub config: &'a RendererConfig,
}

/// Pluggable rendering technique.
pub trait RenderStrategy: Send {
    /// Name for logs and errors.
    fn name(&self) -> &str;

    /// Allocate textures on `device` and register them by name.
    fn initialize(
        &mut self,
        device: &mut dyn RenderDevice,
        textures: &mut TextureRegistry,
    ) -> Result<(), RenderError>;

    /// Called after the device resized its screen textures.
    fn resize(&mut self, _width: u32, _height: u32) -> Result<(), RenderError> {
        Ok(())
    }

    /// Per-frame bookkeeping before queues are fed.
    fn update_step(&mut self, _data: &RenderData) {}

    /// Main pass over the Fancy queue.
    fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError>;

    /// Post-processing into the output texture.
    fn post_process(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError>;

    /// Debug queue overlay. Only called while debug drawing is enabled.
    fn debug(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError>;

    /// X-ray and UI overlays.
    fn ui(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError>;

    /// Texture displayed by default, once initialized.
    fn output(&self) -> Option<TextureId>;
}
