//! Procedural meshes used for gizmos, markers and demo scenes
//!
//! - Box (rectangular prism)
//! - Cylinder (with end caps)
//! - Sphere (UV sphere)
//! - Torus (ring around the Z axis)

mod box_mesh;
mod cylinder;
mod sphere;
mod torus;

pub use box_mesh::generate_box_mesh;
pub use cylinder::{generate_cylinder_mesh, generate_cylinder_mesh_with_segments};
pub use sphere::{generate_sphere_mesh, generate_sphere_mesh_with_segments};
pub use torus::{generate_torus_mesh, generate_torus_mesh_with_segments};
