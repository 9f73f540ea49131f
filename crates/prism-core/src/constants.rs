//! Tessellation defaults for procedural meshes

/// Default number of segments for cylinder mesh generation
pub const CYLINDER_SEGMENTS: u32 = 32;

/// Default number of latitude segments for sphere mesh generation
pub const SPHERE_LAT_SEGMENTS: u32 = 16;

/// Default number of longitude segments for sphere mesh generation
pub const SPHERE_LON_SEGMENTS: u32 = 32;

/// Default segments around the main ring of a torus
pub const TORUS_RING_SEGMENTS: u32 = 48;

/// Default segments around the tube of a torus
pub const TORUS_TUBE_SEGMENTS: u32 = 8;
