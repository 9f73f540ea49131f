//! Shader sources and render pipelines

use std::borrow::Cow;
use std::path::Path;

use crate::device::{DrawStyle, PostEffect};
use crate::error::RenderError;
use crate::scene::PickingGranularity;

use super::mesh_cache::GpuVertex;

/// Screen color textures.
pub(super) const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Shared depth of color draws and of the picking target.
pub(super) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Picking target, one `(ro, vertex, element, edge)` quadruplet per texel.
pub(super) const PICK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Sint;

/// WGSL source of every shader the device uses.
pub(super) struct ShaderSources {
    pub mesh: Cow<'static, str>,
    pub picking: Cow<'static, str>,
    pub blit: Cow<'static, str>,
}

impl ShaderSources {
    pub const MESH: &'static str = "mesh.wgsl";
    pub const PICKING: &'static str = "picking.wgsl";
    pub const BLIT: &'static str = "blit.wgsl";

    /// Sources compiled into the crate.
    pub fn builtin() -> Self {
        Self {
            mesh: Cow::Borrowed(include_str!("../../shaders/mesh.wgsl")),
            picking: Cow::Borrowed(include_str!("../../shaders/picking.wgsl")),
            blit: Cow::Borrowed(include_str!("../../shaders/blit.wgsl")),
        }
    }

    /// Read every shader from `dir`.
    pub fn load(dir: &Path) -> Result<Self, RenderError> {
        let read = |name: &str| {
            std::fs::read_to_string(dir.join(name))
                .map(Cow::Owned)
                .map_err(|e| RenderError::Shader {
                    name: name.to_string(),
                    message: e.to_string(),
                })
        };
        Ok(Self {
            mesh: read(Self::MESH)?,
            picking: read(Self::PICKING)?,
            blit: read(Self::BLIT)?,
        })
    }
}

/// Bind group layouts shared by every pipeline generation.
pub(super) struct Layouts {
    /// Group 0 of mesh and picking pipelines: camera and light.
    pub camera: wgpu::BindGroupLayout,
    /// Group 1 of mesh and picking pipelines: per-object uniform.
    pub object: wgpu::BindGroupLayout,
    /// Group 0 of blit pipelines: source texture and parameters.
    pub blit: wgpu::BindGroupLayout,
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let camera = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[uniform_entry(0)],
        });
        let object = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Bind Group Layout"),
            entries: &[uniform_entry(0)],
        });
        let blit = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blit Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                uniform_entry(1),
            ],
        });
        Self {
            camera,
            object,
            blit,
        }
    }
}

/// Settings of one render pipeline.
struct PipelineConfig<'a> {
    label: &'a str,
    module: &'a wgpu::ShaderModule,
    fragment_entry: &'a str,
    format: wgpu::TextureFormat,
    layout: &'a wgpu::PipelineLayout,
    vertex_layouts: Vec<wgpu::VertexBufferLayout<'static>>,
    depth: Option<(bool, wgpu::CompareFunction)>,
    blend: Option<wgpu::BlendState>,
}

impl<'a> PipelineConfig<'a> {
    /// Triangle list, no culling, depth test Less with writes, no blending.
    fn new(
        label: &'a str,
        module: &'a wgpu::ShaderModule,
        fragment_entry: &'a str,
        format: wgpu::TextureFormat,
        layout: &'a wgpu::PipelineLayout,
    ) -> Self {
        Self {
            label,
            module,
            fragment_entry,
            format,
            layout,
            vertex_layouts: vec![GpuVertex::layout()],
            depth: Some((true, wgpu::CompareFunction::Less)),
            blend: None,
        }
    }

    fn with_blend(mut self, blend: Option<wgpu::BlendState>) -> Self {
        self.blend = blend;
        self
    }

    /// Full-screen pass: no vertex buffers, no depth attachment.
    fn fullscreen(mut self) -> Self {
        self.vertex_layouts.clear();
        self.depth = None;
        self
    }

    fn build(self, device: &wgpu::Device) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} Pipeline", self.label)),
            layout: Some(self.layout),
            vertex: wgpu::VertexState {
                module: self.module,
                entry_point: Some("vs_main"),
                buffers: &self.vertex_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: self.module,
                entry_point: Some(self.fragment_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    blend: self.blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: self.depth.map(|(write, compare)| wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: write,
                depth_compare: compare,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}

/// Every pipeline built from one set of shader sources.
pub(super) struct Pipelines {
    lit: wgpu::RenderPipeline,
    flat: wgpu::RenderPipeline,
    wire: wgpu::RenderPipeline,
    xray: wgpu::RenderPipeline,
    picking: [wgpu::RenderPipeline; 4],
    copy: wgpu::RenderPipeline,
    tonemap: wgpu::RenderPipeline,
}

impl Pipelines {
    /// Compile `sources`. Errors surface through the device error scopes.
    pub fn build(device: &wgpu::Device, layouts: &Layouts, sources: &ShaderSources) -> Self {
        let module = |label: &str, source: &Cow<'static, str>| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.clone()),
            })
        };
        let mesh = module("Mesh Shader", &sources.mesh);
        let picking = module("Picking Shader", &sources.picking);
        let blit = module("Blit Shader", &sources.blit);

        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&layouts.camera, &layouts.object],
            push_constant_ranges: &[],
        });
        let blit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blit Pipeline Layout"),
            bind_group_layouts: &[&layouts.blit],
            push_constant_ranges: &[],
        });

        let mesh_pipeline = |label, entry| {
            PipelineConfig::new(label, &mesh, entry, COLOR_FORMAT, &scene_layout)
        };
        let pick_pipeline = |label, entry| {
            PipelineConfig::new(label, &picking, entry, PICK_FORMAT, &scene_layout).build(device)
        };
        let blit_pipeline = |label, entry| {
            PipelineConfig::new(label, &blit, entry, COLOR_FORMAT, &blit_layout)
                .fullscreen()
                .build(device)
        };

        Self {
            lit: mesh_pipeline("Mesh Lit", "fs_lit").build(device),
            flat: mesh_pipeline("Mesh Flat", "fs_flat").build(device),
            wire: mesh_pipeline("Mesh Wireframe", "fs_wire").build(device),
            xray: mesh_pipeline("Mesh X-Ray", "fs_xray")
                .with_blend(Some(wgpu::BlendState::ALPHA_BLENDING))
                .build(device),
            picking: [
                pick_pipeline("Pick Object", "fs_pick_object"),
                pick_pipeline("Pick Vertex", "fs_pick_vertex"),
                pick_pipeline("Pick Edge", "fs_pick_edge"),
                pick_pipeline("Pick Triangle", "fs_pick_triangle"),
            ],
            copy: blit_pipeline("Blit Copy", "fs_copy"),
            tonemap: blit_pipeline("Blit Tonemap", "fs_tonemap"),
        }
    }

    pub fn style(&self, style: DrawStyle) -> &wgpu::RenderPipeline {
        match style {
            DrawStyle::Lit => &self.lit,
            DrawStyle::Flat => &self.flat,
            DrawStyle::Wireframe => &self.wire,
            DrawStyle::XRay(_) => &self.xray,
        }
    }

    pub fn picking(&self, granularity: PickingGranularity) -> &wgpu::RenderPipeline {
        &self.picking[granularity.index()]
    }

    pub fn effect(&self, effect: PostEffect) -> &wgpu::RenderPipeline {
        match effect {
            PostEffect::Copy => &self.copy,
            PostEffect::Tonemap { .. } => &self.tonemap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ShaderSources::MESH), "// mesh").unwrap();
        match ShaderSources::load(dir.path()) {
            Err(RenderError::Shader { name, .. }) => assert_eq!(name, ShaderSources::PICKING),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_builtin_sources_have_entry_points() {
        let sources = ShaderSources::builtin();
        for entry in ["fs_lit", "fs_flat", "fs_wire", "fs_xray"] {
            assert!(sources.mesh.contains(entry));
        }
        for entry in ["fs_pick_object", "fs_pick_vertex", "fs_pick_edge", "fs_pick_triangle"] {
            assert!(sources.picking.contains(entry));
        }
        assert!(sources.blit.contains("fs_tonemap"));
    }
}
