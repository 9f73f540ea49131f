//! Cylinder mesh generation (with end caps)

use std::f32::consts::TAU;

use glam::Vec3;

use crate::constants::CYLINDER_SEGMENTS;
use crate::mesh::TriangleMesh;

/// Generate a capped cylinder along the Z axis, centered on the origin
pub fn generate_cylinder_mesh(radius: f32, length: f32) -> TriangleMesh {
    generate_cylinder_mesh_with_segments(radius, length, CYLINDER_SEGMENTS)
}

/// Generate a capped cylinder with a custom segment count
pub fn generate_cylinder_mesh_with_segments(radius: f32, length: f32, segments: u32) -> TriangleMesh {
    let half = length * 0.5;
    let ring = |i: u32| {
        let theta = i as f32 / segments as f32 * TAU;
        Vec3::new(theta.cos(), theta.sin(), 0.0)
    };
    let mut mesh = TriangleMesh::default();

    // Side: bottom/top vertex pairs
    for i in 0..=segments {
        let n = ring(i);
        let p = n * radius;
        mesh.vertices.push(p - Vec3::Z * half);
        mesh.vertices.push(p + Vec3::Z * half);
        mesh.normals.extend([n, n]);
    }
    for i in 0..segments {
        let base = i * 2;
        mesh.triangles.push([base, base + 2, base + 1]);
        mesh.triangles.push([base + 1, base + 2, base + 3]);
    }

    // Caps: a center vertex fanned to its own rim, so cap normals stay flat
    for (z, normal) in [(half, Vec3::Z), (-half, Vec3::NEG_Z)] {
        let center = mesh.vertices.len() as u32;
        mesh.vertices.push(Vec3::new(0.0, 0.0, z));
        mesh.normals.push(normal);
        let rim = mesh.vertices.len() as u32;
        for i in 0..=segments {
            mesh.vertices.push(ring(i) * radius + Vec3::new(0.0, 0.0, z));
            mesh.normals.push(normal);
        }
        for i in 0..segments {
            if z > 0.0 {
                mesh.triangles.push([center, rim + i, rim + i + 1]);
            } else {
                mesh.triangles.push([center, rim + i + 1, rim + i]);
            }
        }
    }

    mesh
}
