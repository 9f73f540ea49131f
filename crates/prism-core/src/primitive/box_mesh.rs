//! Box (rectangular prism) mesh generation

use glam::Vec3;

use crate::mesh::TriangleMesh;

/// Generate a box centered on the origin
///
/// `size` is [x, y, z]. Each face gets its own 4 vertices so normals stay flat:
/// 24 vertices and 12 counter-clockwise triangles facing outward.
pub fn generate_box_mesh(size: [f32; 3]) -> TriangleMesh {
    let half = Vec3::from(size) * 0.5;
    let mut mesh = TriangleMesh {
        vertices: Vec::with_capacity(24),
        normals: Vec::with_capacity(24),
        triangles: Vec::with_capacity(12),
    };

    for axis in 0..3 {
        for sign in [1.0f32, -1.0] {
            let mut normal = Vec3::ZERO;
            normal[axis] = sign;
            // (u, v) span the face with u x v == normal
            let mut u = Vec3::ZERO;
            let mut v = Vec3::ZERO;
            u[(axis + 1) % 3] = 1.0;
            v[(axis + 2) % 3] = sign;

            let center = normal * half;
            let (du, dv) = (u * half, v * half);
            let base = mesh.vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                mesh.vertices.push(center + du * su + dv * sv);
                mesh.normals.push(normal);
            }
            mesh.triangles.push([base, base + 1, base + 2]);
            mesh.triangles.push([base, base + 2, base + 3]);
        }
    }

    mesh
}
