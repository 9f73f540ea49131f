//! Hardware render device on `wgpu`
//!
//! Screen textures are `Rgba8Unorm`, every color draw shares one
//! `Depth32Float` buffer, and picking renders into an `Rgba32Sint` target with
//! its own depth. Meshes are uploaded once per render object and re-uploaded
//! when the object switches to another mesh. Each device operation records
//! and submits its own command encoder.

mod mesh_cache;
mod pipelines;
mod readback;

use std::path::PathBuf;
use std::sync::Arc;

use mesh_cache::{CameraUniform, MeshCache};
use pipelines::{COLOR_FORMAT, DEPTH_FORMAT, Layouts, PICK_FORMAT, Pipelines, ShaderSources};
use wgpu::util::DeviceExt;

use super::{
    DrawItem, DrawStyle, FrameImage, OutputTarget, PostEffect, RenderDevice, TextureId, ViewParams,
};
use crate::error::RenderError;
use crate::picking::{PickBuffer, PickTexel};
use crate::scene::PickingGranularity;

const PICK_BACKGROUND: wgpu::Color = wgpu::Color {
    r: -1.0,
    g: -1.0,
    b: -1.0,
    a: -1.0,
};

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BlitParams {
    exposure: f32,
    gamma: f32,
    _pad: [f32; 2],
}

/// A texture sized to the viewport and its default view.
struct ScreenTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl ScreenTexture {
    fn new(
        device: &wgpu::Device,
        label: &str,
        (width, height): (u32, u32),
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    fn color(device: &wgpu::Device, label: &str, size: (u32, u32)) -> Self {
        Self::new(
            device,
            label,
            size,
            COLOR_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        )
    }

    fn depth(device: &wgpu::Device, label: &str, size: (u32, u32)) -> Self {
        Self::new(
            device,
            label,
            size,
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        )
    }

    fn picking(device: &wgpu::Device, size: (u32, u32)) -> Self {
        Self::new(
            device,
            "Picking Texture",
            size,
            PICK_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        )
    }
}

/// Begin a pass that clears or loads the given attachments.
fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    label: &str,
    color: Option<(&wgpu::TextureView, wgpu::LoadOp<wgpu::Color>)>,
    depth: Option<(&wgpu::TextureView, wgpu::LoadOp<f32>)>,
) -> wgpu::RenderPass<'e> {
    let color_attachments: Vec<_> = color
        .into_iter()
        .map(|(view, load)| {
            Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })
        })
        .collect();
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &color_attachments,
        depth_stencil_attachment: depth.map(|(view, load)| {
            wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

/// [`RenderDevice`] backed by a `wgpu` device and queue.
pub struct WgpuDevice {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    shader_dir: Option<PathBuf>,
    width: u32,
    height: u32,

    layouts: Layouts,
    pipelines: Pipelines,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    blit_buffer: wgpu::Buffer,

    // Screen-sized targets
    textures: Vec<(String, ScreenTexture)>,
    depth: ScreenTexture,
    picking: ScreenTexture,
    picking_depth: ScreenTexture,
    backbuffer: ScreenTexture,
    external: Option<wgpu::TextureView>,

    meshes: MeshCache,
    in_frame: bool,
}

impl WgpuDevice {
    /// Create a device rendering at `width` x `height` with the built-in shaders.
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>, width: u32, height: u32) -> Self {
        let size = (width.max(1), height.max(1));
        let layouts = Layouts::new(&device);
        let pipelines = Pipelines::build(&device, &layouts, &ShaderSources::builtin());

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &layouts.camera,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });
        let blit_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Blit Params Buffer"),
            contents: bytemuck::cast_slice(&[BlitParams {
                exposure: 1.0,
                gamma: 1.0,
                _pad: [0.0; 2],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        tracing::info!(
            "WgpuDevice created: {}x{}, picking target {:?}",
            size.0,
            size.1,
            PICK_FORMAT
        );

        Self {
            depth: ScreenTexture::depth(&device, "Depth Texture", size),
            picking: ScreenTexture::picking(&device, size),
            picking_depth: ScreenTexture::depth(&device, "Picking Depth Texture", size),
            backbuffer: ScreenTexture::color(&device, "Backbuffer", size),
            device,
            queue,
            shader_dir: None,
            width: size.0,
            height: size.1,
            layouts,
            pipelines,
            camera_buffer,
            camera_bind_group,
            blit_buffer,
            textures: Vec::new(),
            external: None,
            meshes: MeshCache::default(),
            in_frame: false,
        }
    }

    /// Read shaders from `dir` on [`RenderDevice::reload_shaders`].
    pub fn with_shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = Some(dir.into());
        self
    }

    /// Composite into `view` from now on. The view must be `Rgba8Unorm` and
    /// match the device size.
    pub fn bind_external_target(&mut self, view: wgpu::TextureView) {
        self.external = Some(view);
    }

    /// Go back to compositing into the backbuffer.
    pub fn unbind_external_target(&mut self) {
        self.external = None;
    }

    /// The device's own presentation texture.
    pub fn backbuffer_view(&self) -> &wgpu::TextureView {
        &self.backbuffer.view
    }

    /// Format of every color target.
    pub fn color_format(&self) -> wgpu::TextureFormat {
        COLOR_FORMAT
    }

    fn texture(&self, id: TextureId) -> Result<&ScreenTexture, RenderError> {
        self.textures
            .get(id.0 as usize)
            .map(|(_, t)| t)
            .ok_or(RenderError::UnknownTexture(id))
    }

    fn encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }

    fn submit(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn ensure_frame(&self, what: &str) -> Result<(), RenderError> {
        if self.in_frame {
            Ok(())
        } else {
            Err(RenderError::Device(format!("{} outside of a frame", what)))
        }
    }

    fn prepare(&mut self, items: &[DrawItem], alpha: f32) {
        for item in items {
            self.meshes
                .prepare(&self.device, &self.queue, &self.layouts.object, item, alpha);
        }
    }

    fn record_items(&self, pass: &mut wgpu::RenderPass<'_>, pipeline: &wgpu::RenderPipeline, items: &[DrawItem]) {
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        for item in items {
            if let Some(object) = self.meshes.get(item.id) {
                pass.set_bind_group(1, &object.bind_group, &[]);
                pass.set_vertex_buffer(0, object.vertex_buffer.slice(..));
                pass.draw(0..object.vertex_count, 0..1);
            }
        }
    }

    fn fullscreen(
        &self,
        src: &wgpu::TextureView,
        dst: &wgpu::TextureView,
        effect: PostEffect,
    ) {
        let params = match effect {
            PostEffect::Copy => BlitParams {
                exposure: 1.0,
                gamma: 1.0,
                _pad: [0.0; 2],
            },
            PostEffect::Tonemap { exposure, gamma } => BlitParams {
                exposure,
                gamma: gamma.max(1e-3),
                _pad: [0.0; 2],
            },
        };
        self.queue
            .write_buffer(&self.blit_buffer, 0, bytemuck::cast_slice(&[params]));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blit Bind Group"),
            layout: &self.layouts.blit,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(src),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.blit_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self.encoder("Blit Encoder");
        {
            let mut pass = begin_pass(
                &mut encoder,
                "Blit Pass",
                Some((dst, wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT))),
                None,
            );
            pass.set_pipeline(self.pipelines.effect(effect));
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.submit(encoder);
    }
}

impl RenderDevice for WgpuDevice {
    fn backend_name(&self) -> &str {
        "wgpu"
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::Device(format!(
                "cannot allocate {}x{} targets",
                width, height
            )));
        }
        let size = (width, height);
        let device = &self.device;
        for (label, texture) in &mut self.textures {
            *texture = ScreenTexture::color(device, label, size);
        }
        self.depth = ScreenTexture::depth(device, "Depth Texture", size);
        self.picking = ScreenTexture::picking(device, size);
        self.picking_depth = ScreenTexture::depth(device, "Picking Depth Texture", size);
        self.backbuffer = ScreenTexture::color(device, "Backbuffer", size);
        self.width = width;
        self.height = height;
        tracing::debug!("WgpuDevice resized to {}x{}", width, height);
        Ok(())
    }

    fn create_texture(&mut self, label: &str) -> Result<TextureId, RenderError> {
        let id = TextureId(self.textures.len() as u32);
        let texture = ScreenTexture::color(&self.device, label, (self.width, self.height));
        self.textures.push((label.to_string(), texture));
        Ok(id)
    }

    fn bound_target(&self) -> OutputTarget {
        if self.external.is_some() {
            OutputTarget::External
        } else {
            OutputTarget::Backbuffer
        }
    }

    fn begin_frame(&mut self, view: &ViewParams) -> Result<(), RenderError> {
        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[CameraUniform::new(view)]),
        );
        self.in_frame = true;
        Ok(())
    }

    fn clear(&mut self, target: TextureId, color: [f32; 4]) -> Result<(), RenderError> {
        let view = &self.texture(target)?.view;
        let [r, g, b, a] = color.map(f64::from);
        let mut encoder = self.encoder("Clear Encoder");
        begin_pass(
            &mut encoder,
            "Clear Pass",
            Some((view, wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }))),
            Some((&self.depth.view, wgpu::LoadOp::Clear(1.0))),
        );
        self.submit(encoder);
        Ok(())
    }

    fn clear_depth(&mut self) -> Result<(), RenderError> {
        let mut encoder = self.encoder("Clear Depth Encoder");
        begin_pass(
            &mut encoder,
            "Clear Depth Pass",
            None,
            Some((&self.depth.view, wgpu::LoadOp::Clear(1.0))),
        );
        self.submit(encoder);
        Ok(())
    }

    fn draw(
        &mut self,
        target: TextureId,
        style: DrawStyle,
        items: &[DrawItem],
    ) -> Result<(), RenderError> {
        self.ensure_frame("draw")?;
        self.texture(target)?;
        let alpha = match style {
            DrawStyle::XRay(alpha) => alpha,
            _ => 1.0,
        };
        self.prepare(items, alpha);

        let view = &self.texture(target)?.view;
        let mut encoder = self.encoder("Draw Encoder");
        {
            let mut pass = begin_pass(
                &mut encoder,
                "Draw Pass",
                Some((view, wgpu::LoadOp::Load)),
                Some((&self.depth.view, wgpu::LoadOp::Load)),
            );
            self.record_items(&mut pass, self.pipelines.style(style), items);
        }
        self.submit(encoder);
        Ok(())
    }

    fn clear_picking(&mut self) -> Result<(), RenderError> {
        let mut encoder = self.encoder("Clear Picking Encoder");
        begin_pass(
            &mut encoder,
            "Clear Picking Pass",
            Some((&self.picking.view, wgpu::LoadOp::Clear(PICK_BACKGROUND))),
            Some((&self.picking_depth.view, wgpu::LoadOp::Clear(1.0))),
        );
        self.submit(encoder);
        Ok(())
    }

    fn clear_picking_depth(&mut self) -> Result<(), RenderError> {
        let mut encoder = self.encoder("Clear Picking Depth Encoder");
        begin_pass(
            &mut encoder,
            "Clear Picking Depth Pass",
            None,
            Some((&self.picking_depth.view, wgpu::LoadOp::Clear(1.0))),
        );
        self.submit(encoder);
        Ok(())
    }

    fn draw_picking(
        &mut self,
        granularity: PickingGranularity,
        items: &[DrawItem],
    ) -> Result<(), RenderError> {
        self.ensure_frame("picking draw")?;
        self.prepare(items, 1.0);

        let mut encoder = self.encoder("Picking Encoder");
        {
            let mut pass = begin_pass(
                &mut encoder,
                "Picking Pass",
                Some((&self.picking.view, wgpu::LoadOp::Load)),
                Some((&self.picking_depth.view, wgpu::LoadOp::Load)),
            );
            self.record_items(&mut pass, self.pipelines.picking(granularity), items);
        }
        self.submit(encoder);
        Ok(())
    }

    fn read_picking(&mut self) -> Result<PickBuffer, RenderError> {
        let bytes = readback::read_texture(&self.device, &self.queue, &self.picking.texture, 16)?;
        let rows = bytes
            .chunks_exact(16)
            .map(|chunk| PickTexel::from_array(bytemuck::pod_read_unaligned::<[i32; 4]>(chunk)))
            .collect();
        Ok(PickBuffer::from_top_down_rows(self.width, self.height, rows))
    }

    fn blit(&mut self, src: TextureId, dst: TextureId, effect: PostEffect) -> Result<(), RenderError> {
        if src == dst {
            return Err(RenderError::Device(format!(
                "blit source and destination are both {:?}",
                src
            )));
        }
        let src = &self.texture(src)?.view;
        let dst = &self.texture(dst)?.view;
        self.fullscreen(src, dst, effect);
        Ok(())
    }

    fn composite(&mut self, src: TextureId, target: OutputTarget) -> Result<(), RenderError> {
        let src = &self.texture(src)?.view;
        let dst = match target {
            OutputTarget::Backbuffer => &self.backbuffer.view,
            OutputTarget::External => self
                .external
                .as_ref()
                .ok_or_else(|| RenderError::Device("no external target bound".into()))?,
        };
        self.fullscreen(src, dst, PostEffect::Copy);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.in_frame = false;
        self.meshes.prune();
        Ok(())
    }

    fn read_texture(&mut self, texture: TextureId) -> Result<FrameImage, RenderError> {
        let rgba = readback::read_texture(&self.device, &self.queue, &self.texture(texture)?.texture, 4)?;
        Ok(FrameImage {
            width: self.width,
            height: self.height,
            rgba,
        })
    }

    fn reload_shaders(&mut self) -> Result<(), RenderError> {
        let sources = match &self.shader_dir {
            Some(dir) => ShaderSources::load(dir)?,
            None => ShaderSources::builtin(),
        };

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipelines = Pipelines::build(&self.device, &self.layouts, &sources);
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::Shader {
                name: "pipelines".into(),
                message: error.to_string(),
            });
        }

        self.pipelines = pipelines;
        self.meshes.clear();
        tracing::info!("WgpuDevice shaders reloaded");
        Ok(())
    }
}
