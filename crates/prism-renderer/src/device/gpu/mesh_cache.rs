//! GPU copies of scene meshes

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use prism_core::TriangleMesh;
use prism_core::mesh::utils::triangle_normal;
use wgpu::util::DeviceExt;

use crate::device::DrawItem;
use crate::scene::RenderObjectId;

/// Unindexed vertex: every triangle gets its own three corners so the
/// barycentric and index attributes can differ per triangle.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(super) struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub barycentric: [f32; 3],
    pub triangle: u32,
    pub corners: [u32; 3],
}

impl GpuVertex {
    const ATTRIBUTES: &'static [wgpu::VertexAttribute] = &[
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: 12,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: 24,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: 36,
            shader_location: 3,
            format: wgpu::VertexFormat::Uint32,
        },
        wgpu::VertexAttribute {
            offset: 40,
            shader_location: 4,
            format: wgpu::VertexFormat::Uint32x3,
        },
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: Self::ATTRIBUTES,
        }
    }
}

/// Expand an indexed mesh into [`GpuVertex`] triples.
pub(super) fn expand(mesh: &TriangleMesh) -> Vec<GpuVertex> {
    let smooth = mesh.normals.len() == mesh.vertices.len();
    let mut vertices = Vec::with_capacity(mesh.triangles.len() * 3);
    for (t, &corners) in mesh.triangles.iter().enumerate() {
        let face = triangle_normal(mesh, t);
        for (k, &index) in corners.iter().enumerate() {
            let mut barycentric = [0.0; 3];
            barycentric[k] = 1.0;
            let normal = if smooth { mesh.normals[index as usize] } else { face };
            vertices.push(GpuVertex {
                position: mesh.vertices[index as usize].to_array(),
                normal: normal.to_array(),
                barycentric,
                triangle: t as u32,
                corners,
            });
        }
    }
    vertices
}

/// Per-draw object data, group 1 of the mesh and picking shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(super) struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub pick_id: i32,
    pub alpha: f32,
    pub _pad: [u32; 2],
}

impl ObjectUniform {
    pub fn new(item: &DrawItem, alpha: f32) -> Self {
        let normal_matrix = item.transform.inverse().transpose();
        Self {
            model: item.transform.to_cols_array_2d(),
            normal_matrix: if normal_matrix.is_finite() {
                normal_matrix.to_cols_array_2d()
            } else {
                Mat4::IDENTITY.to_cols_array_2d()
            },
            color: item.color,
            pick_id: item.id.pick_index(),
            alpha,
            _pad: [0; 2],
        }
    }
}

/// Frame-wide camera and light, group 0 of the mesh and picking shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(super) struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub light_dir: [f32; 4],
    pub light_color: [f32; 4],
}

impl CameraUniform {
    pub fn new(view: &crate::device::ViewParams) -> Self {
        let light = &view.light;
        let color: Vec3 = light.color * light.intensity;
        Self {
            view_proj: view.view_projection().to_cols_array_2d(),
            eye: view.eye.extend(1.0).to_array(),
            light_dir: light.direction.extend(0.0).to_array(),
            light_color: color.extend(light.ambient).to_array(),
        }
    }
}

/// Vertex buffer and uniform of one render object.
pub(super) struct GpuObject {
    mesh: Arc<TriangleMesh>,
    pub vertex_buffer: wgpu::Buffer,
    pub vertex_count: u32,
    uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    used: bool,
}

/// GPU objects keyed by render object id.
///
/// An entry is rebuilt when its object points at a different mesh, and
/// dropped at the end of a frame in which it was not drawn.
#[derive(Default)]
pub(super) struct MeshCache {
    objects: HashMap<RenderObjectId, GpuObject>,
}

impl MeshCache {
    /// Upload `item` if needed and write its uniform.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        item: &DrawItem,
        alpha: f32,
    ) {
        let stale = self
            .objects
            .get(&item.id)
            .is_none_or(|o| !Arc::ptr_eq(&o.mesh, &item.mesh));
        if stale {
            let object = Self::upload(device, layout, item);
            self.objects.insert(item.id, object);
        }
        if let Some(object) = self.objects.get_mut(&item.id) {
            queue.write_buffer(
                &object.uniform_buffer,
                0,
                bytemuck::cast_slice(&[ObjectUniform::new(item, alpha)]),
            );
            object.used = true;
        }
    }

    fn upload(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, item: &DrawItem) -> GpuObject {
        let vertices = expand(&item.mesh);
        tracing::debug!(
            "Uploading mesh of {}: {} triangles, {} GPU vertices",
            item.id,
            item.mesh.triangle_count(),
            vertices.len()
        );

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Object Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Object Uniform Buffer"),
            contents: bytemuck::cast_slice(&[ObjectUniform::new(item, 1.0)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        GpuObject {
            mesh: item.mesh.clone(),
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            uniform_buffer,
            bind_group,
            used: false,
        }
    }

    pub fn get(&self, id: RenderObjectId) -> Option<&GpuObject> {
        self.objects.get(&id)
    }

    /// Drop entries not drawn since the last call.
    pub fn prune(&mut self) {
        self.objects.retain(|_, o| std::mem::take(&mut o.used));
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.objects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<GpuVertex>(), 52);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 160);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 112);
        let last = GpuVertex::ATTRIBUTES.last().unwrap();
        assert_eq!(last.offset, 40);
    }

    #[test]
    fn test_expand_keeps_triangle_identity() {
        let mesh = TriangleMesh::new(
            vec![
                Vec3::ZERO,
                Vec3::X,
                Vec3::Y,
                Vec3::new(1.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [1, 3, 2]],
        );
        let vertices = expand(&mesh);
        assert_eq!(vertices.len(), 6);
        assert_eq!(vertices[4].triangle, 1);
        assert_eq!(vertices[4].corners, [1, 3, 2]);
        assert_eq!(vertices[4].position, [1.0, 1.0, 0.0]);
        assert_eq!(vertices[4].barycentric, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[0].normal, [0.0, 0.0, 1.0]);
    }
}
