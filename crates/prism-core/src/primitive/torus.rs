//! Torus mesh generation, used for rotation handles

use std::f32::consts::TAU;

use glam::Vec3;

use crate::constants::{TORUS_RING_SEGMENTS, TORUS_TUBE_SEGMENTS};
use crate::mesh::TriangleMesh;

/// Generate a torus lying in the XY plane
pub fn generate_torus_mesh(major_radius: f32, minor_radius: f32) -> TriangleMesh {
    generate_torus_mesh_with_segments(
        major_radius,
        minor_radius,
        TORUS_RING_SEGMENTS,
        TORUS_TUBE_SEGMENTS,
    )
}

/// Generate a torus with custom ring and tube resolution
pub fn generate_torus_mesh_with_segments(
    major_radius: f32,
    minor_radius: f32,
    ring_segments: u32,
    tube_segments: u32,
) -> TriangleMesh {
    let mut mesh = TriangleMesh::default();

    for i in 0..ring_segments {
        let u = i as f32 / ring_segments as f32 * TAU;
        let radial = Vec3::new(u.cos(), u.sin(), 0.0);
        for j in 0..tube_segments {
            let v = j as f32 / tube_segments as f32 * TAU;
            let normal = radial * v.cos() + Vec3::Z * v.sin();
            mesh.vertices.push(radial * major_radius + normal * minor_radius);
            mesh.normals.push(normal);
        }
    }

    // Indices wrap in both directions, so no seam vertices are needed
    let index = |i: u32, j: u32| (i % ring_segments) * tube_segments + (j % tube_segments);
    for i in 0..ring_segments {
        for j in 0..tube_segments {
            let a = index(i, j);
            let b = index(i + 1, j);
            let c = index(i + 1, j + 1);
            let d = index(i, j + 1);
            mesh.triangles.push([a, b, c]);
            mesh.triangles.push([a, c, d]);
        }
    }

    mesh
}
