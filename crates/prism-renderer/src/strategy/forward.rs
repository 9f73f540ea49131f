//! Single-pass forward strategy

use crate::device::{DrawItem, DrawStyle, PostEffect, RenderDevice, TextureId};
use crate::error::RenderError;
use crate::scene::RenderLayer;
use crate::textures::TextureRegistry;

use super::{FrameContext, RenderStrategy};

/// Main pass into "Fancy", post-processed into "Final", overlays on "Final".
#[derive(Debug, Default)]
pub struct ForwardStrategy {
    fancy: Option<TextureId>,
    output: Option<TextureId>,
}

impl ForwardStrategy {
    /// Texture name of the main pass.
    pub const FANCY: &'static str = "Fancy";
    /// Texture name of the post-processed image.
    pub const FINAL: &'static str = "Final";

    /// Create an uninitialized strategy.
    pub fn new() -> Self {
        Self::default()
    }

    fn targets(&self) -> Result<(TextureId, TextureId), RenderError> {
        match (self.fancy, self.output) {
            (Some(fancy), Some(output)) => Ok((fancy, output)),
            _ => Err(RenderError::Strategy {
                strategy: self.name().to_string(),
                message: "used before initialize".into(),
            }),
        }
    }
}

fn draw_layer(
    ctx: &mut FrameContext<'_>,
    layer: RenderLayer,
    target: TextureId,
    style: DrawStyle,
) -> Result<bool, RenderError> {
    let items = DrawItem::collect(ctx.queues.queue(layer), ctx.objects);
    if items.is_empty() {
        return Ok(false);
    }
    ctx.device.draw(target, style, &items)?;
    Ok(true)
}

impl RenderStrategy for ForwardStrategy {
    fn name(&self) -> &str {
        "forward"
    }

    fn initialize(
        &mut self,
        device: &mut dyn RenderDevice,
        textures: &mut TextureRegistry,
    ) -> Result<(), RenderError> {
        let fancy = device.create_texture(Self::FANCY)?;
        let output = device.create_texture(Self::FINAL)?;
        textures.insert(Self::FANCY, fancy);
        textures.insert(Self::FINAL, output);
        self.fancy = Some(fancy);
        self.output = Some(output);
        tracing::debug!("Forward strategy initialized on {}", device.backend_name());
        Ok(())
    }

    fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError> {
        let (fancy, _) = self.targets()?;
        ctx.device
            .clear(fancy, ctx.config.viewport.background_color)?;
        let style = if ctx.config.debug.wireframe {
            DrawStyle::Wireframe
        } else {
            DrawStyle::Lit
        };
        draw_layer(ctx, RenderLayer::Fancy, fancy, style)?;
        Ok(())
    }

    fn post_process(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError> {
        let (fancy, output) = self.targets()?;
        let post = &ctx.config.post_process;
        let effect = if post.enabled {
            PostEffect::Tonemap {
                exposure: post.exposure,
                gamma: post.gamma,
            }
        } else {
            PostEffect::Copy
        };
        ctx.device.blit(fancy, output, effect)
    }

    fn debug(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError> {
        let (_, output) = self.targets()?;
        draw_layer(ctx, RenderLayer::Debug, output, DrawStyle::Flat)?;
        Ok(())
    }

    fn ui(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError> {
        let (_, output) = self.targets()?;
        let alpha = ctx.config.debug.xray_alpha;
        if !ctx.queues.queue(RenderLayer::XRay).is_empty() {
            ctx.device.clear_depth()?;
            draw_layer(ctx, RenderLayer::XRay, output, DrawStyle::XRay(alpha))?;
        }
        if !ctx.queues.queue(RenderLayer::Ui).is_empty() {
            ctx.device.clear_depth()?;
            draw_layer(ctx, RenderLayer::Ui, output, DrawStyle::Flat)?;
        }
        Ok(())
    }

    fn output(&self) -> Option<TextureId> {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RendererConfig;
    use crate::device::SoftwareDevice;
    use crate::queue::RenderQueues;
    use crate::scene::RenderObjectManager;

    #[test]
    fn test_initialize_registers_textures() {
        let mut device = SoftwareDevice::new(8, 8);
        let mut textures = TextureRegistry::new();
        let mut strategy = ForwardStrategy::new();
        strategy.initialize(&mut device, &mut textures).unwrap();
        assert_eq!(textures.names(), ["Fancy", "Final"]);
        assert_eq!(strategy.output(), textures.get("Final"));
    }

    #[test]
    fn test_render_before_initialize_fails() {
        let mut device = SoftwareDevice::new(8, 8);
        let objects = RenderObjectManager::new();
        let queues = RenderQueues::feed(&objects);
        let textures = TextureRegistry::new();
        let config = RendererConfig::default();
        let mut ctx = FrameContext {
            device: &mut device,
            queues: &queues,
            objects: &objects,
            textures: &textures,
            config: &config,
        };
        let err = ForwardStrategy::new().render(&mut ctx).unwrap_err();
        assert!(matches!(err, RenderError::Strategy { .. }));
    }
}
