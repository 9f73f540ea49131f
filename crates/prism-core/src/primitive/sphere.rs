//! Sphere mesh generation (UV sphere)

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::constants::{SPHERE_LAT_SEGMENTS, SPHERE_LON_SEGMENTS};
use crate::mesh::TriangleMesh;

/// Generate a UV sphere with the default resolution
pub fn generate_sphere_mesh(radius: f32) -> TriangleMesh {
    generate_sphere_mesh_with_segments(radius, SPHERE_LAT_SEGMENTS, SPHERE_LON_SEGMENTS)
}

/// Generate a UV sphere with `lat_segments` bands from pole to pole and
/// `lon_segments` slices around the Z axis
pub fn generate_sphere_mesh_with_segments(
    radius: f32,
    lat_segments: u32,
    lon_segments: u32,
) -> TriangleMesh {
    let mut mesh = TriangleMesh::default();

    for lat in 0..=lat_segments {
        let theta = lat as f32 / lat_segments as f32 * PI;
        for lon in 0..=lon_segments {
            let phi = lon as f32 / lon_segments as f32 * TAU;
            let n = Vec3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos());
            mesh.vertices.push(n * radius);
            mesh.normals.push(n);
        }
    }

    let row = lon_segments + 1;
    for lat in 0..lat_segments {
        for lon in 0..lon_segments {
            let a = lat * row + lon;
            let b = a + row;
            mesh.triangles.push([a, b, a + 1]);
            mesh.triangles.push([a + 1, b, b + 1]);
        }
    }

    mesh
}
