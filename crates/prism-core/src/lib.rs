//! Core geometry for the Prism engine.
//!
//! - [`mesh`]: indexed triangle meshes, mesh utilities and file loading (OBJ, STL)
//! - [`primitive`]: procedural box, cylinder, sphere and torus meshes
//! - [`bounds`] / [`ray`]: axis-aligned boxes and rays used by picking and camera fitting
//! - [`input`]: toolkit-independent input enums shared by the renderer and the viewer

pub mod bounds;
pub mod constants;
pub mod input;
pub mod mesh;
pub mod primitive;
pub mod ray;

pub use bounds::BoundingBox;
pub use input::MouseButton;
pub use mesh::{MeshError, MeshFormat, TriangleMesh, load_mesh};
pub use ray::Ray;
