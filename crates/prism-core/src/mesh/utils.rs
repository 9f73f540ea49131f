//! Geometry and topology helpers for [`TriangleMesh`].

use std::collections::HashMap;

use glam::{Mat3, Mat4, Vec3};

use super::TriangleMesh;
use crate::bounds::BoundingBox;
use crate::ray::Ray;

/// Corner positions of triangle `t`.
pub fn triangle_vertices(mesh: &TriangleMesh, t: usize) -> [Vec3; 3] {
    mesh.triangles[t].map(|i| mesh.vertices[i as usize])
}

pub fn triangle_area(mesh: &TriangleMesh, t: usize) -> f32 {
    let [a, b, c] = triangle_vertices(mesh, t);
    (b - a).cross(c - a).length() * 0.5
}

/// Unit normal of triangle `t` (counter-clockwise winding), zero when degenerate.
pub fn triangle_normal(mesh: &TriangleMesh, t: usize) -> Vec3 {
    let [a, b, c] = triangle_vertices(mesh, t);
    (b - a).cross(c - a).normalize_or_zero()
}

pub fn aabb(mesh: &TriangleMesh) -> BoundingBox {
    BoundingBox::from_points(mesh.vertices.iter().copied())
}

/// For triangle `(v1, v2, v3)` returns `v3`, whatever the rotation of the triangle.
pub fn last_vertex(triangle: &[u32; 3], v1: u32, v2: u32) -> Option<u32> {
    triangle
        .iter()
        .copied()
        .find(|&v| v != v1 && v != v2)
        .filter(|_| contains_edge(triangle, v1, v2))
}

/// True if the triangle has the (undirected) edge `v1`-`v2`.
pub fn contains_edge(triangle: &[u32; 3], v1: u32, v2: u32) -> bool {
    v1 != v2 && triangle.contains(&v1) && triangle.contains(&v2)
}

/// Per-vertex normals averaged from the area-weighted normals of adjacent triangles.
pub fn auto_normals(mesh: &TriangleMesh) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; mesh.vertices.len()];
    for (t, tri) in mesh.triangles.iter().enumerate() {
        let [a, b, c] = triangle_vertices(mesh, t);
        let n = (b - a).cross(c - a);
        for &i in tri {
            normals[i as usize] += n;
        }
    }
    normals.iter_mut().for_each(|n| *n = n.normalize_or_zero());
    normals
}

fn position_key(v: Vec3) -> [u32; 3] {
    // +0.0 folds -0.0 onto 0.0
    (v + Vec3::ZERO).to_array().map(f32::to_bits)
}

/// For each vertex, the index of the first vertex at the same position.
///
/// Returns `None` when every position is unique.
pub fn find_duplicates(mesh: &TriangleMesh) -> Option<Vec<u32>> {
    let mut first: HashMap<[u32; 3], u32> = HashMap::with_capacity(mesh.vertices.len());
    let mut found = false;
    let map: Vec<u32> = mesh
        .vertices
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let owner = *first.entry(position_key(v)).or_insert(i as u32);
            found |= owner != i as u32;
            owner
        })
        .collect();
    found.then_some(map)
}

/// Merges vertices sharing a position and reindexes the triangles.
///
/// Returns the old-to-new vertex index map.
pub fn remove_duplicates(mesh: &mut TriangleMesh) -> Vec<u32> {
    let Some(duplicates) = find_duplicates(mesh) else {
        return (0..mesh.vertices.len() as u32).collect();
    };

    let keep_normals = mesh.normals.len() == mesh.vertices.len();
    let mut vertices = Vec::new();
    let mut normals = Vec::new();
    let mut remap = vec![0u32; mesh.vertices.len()];

    for (i, &owner) in duplicates.iter().enumerate() {
        if owner as usize == i {
            remap[i] = vertices.len() as u32;
            vertices.push(mesh.vertices[i]);
            if keep_normals {
                normals.push(mesh.normals[i]);
            }
        } else {
            remap[i] = remap[owner as usize];
        }
    }

    for tri in &mut mesh.triangles {
        *tri = tri.map(|i| remap[i as usize]);
    }
    mesh.vertices = vertices;
    mesh.normals = normals;
    remap
}

/// Unique undirected edges `[min, max]`, in order of first appearance.
pub fn edges(mesh: &TriangleMesh) -> Vec<[u32; 2]> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for tri in &mesh.triangles {
        for k in 0..3 {
            let (a, b) = (tri[k], tri[(k + 1) % 3]);
            let edge = [a.min(b), a.max(b)];
            if seen.insert(edge) {
                out.push(edge);
            }
        }
    }
    out
}

/// Result of [`cast_ray`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCastResult {
    /// Closest triangle hit by the ray.
    pub hit_triangle: Option<usize>,
    /// Corner of the hit triangle closest to the hit point.
    pub nearest_vertex: Option<u32>,
    /// Ray parameter of the hit, `f32::INFINITY` on a miss.
    pub t: f32,
}

impl RayCastResult {
    pub const MISS: Self = Self {
        hit_triangle: None,
        nearest_vertex: None,
        t: f32::INFINITY,
    };

    pub fn is_hit(&self) -> bool {
        self.hit_triangle.is_some()
    }
}

/// Möller-Trumbore intersection, two-sided. Returns `t`.
fn intersect_triangle(ray: &Ray, [a, b, c]: [Vec3; 3]) -> Option<f32> {
    const EPSILON: f32 = 1e-7;
    let e1 = b - a;
    let e2 = c - a;
    let p = ray.direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}

/// Closest triangle hit by `ray`, in the mesh's own frame.
pub fn cast_ray(mesh: &TriangleMesh, ray: &Ray) -> RayCastResult {
    let mut result = RayCastResult::MISS;
    for t in 0..mesh.triangle_count() {
        let corners = triangle_vertices(mesh, t);
        let Some(dist) = intersect_triangle(ray, corners) else {
            continue;
        };
        if dist < result.t {
            let hit = ray.at(dist);
            let nearest = (0..3)
                .min_by(|&i, &j| {
                    corners[i]
                        .distance_squared(hit)
                        .total_cmp(&corners[j].distance_squared(hit))
                })
                .map(|k| mesh.triangles[t][k]);
            result = RayCastResult {
                hit_triangle: Some(t),
                nearest_vertex: nearest,
                t: dist,
            };
        }
    }
    result
}

/// Mean length of the unique edges, 0 for a mesh without edges.
pub fn mean_edge_length(mesh: &TriangleMesh) -> f32 {
    let edges = edges(mesh);
    if edges.is_empty() {
        return 0.0;
    }
    let total: f32 = edges
        .iter()
        .map(|&[a, b]| mesh.vertices[a as usize].distance(mesh.vertices[b as usize]))
        .sum();
    total / edges.len() as f32
}

/// Applies `transform` to every vertex (and normal).
pub fn bake_transform(mesh: &mut TriangleMesh, transform: &Mat4) {
    for v in &mut mesh.vertices {
        *v = transform.transform_point3(*v);
    }
    let normal_matrix = Mat3::from_mat4(*transform).inverse().transpose();
    for n in &mut mesh.normals {
        *n = (normal_matrix * *n).normalize_or_zero();
    }
}

/// Signed volume enclosed by the mesh, summed over tetrahedra formed with `origin`.
///
/// Positive for a closed mesh with outward (counter-clockwise) winding.
pub fn volume(mesh: &TriangleMesh, origin: Vec3) -> f32 {
    (0..mesh.triangle_count())
        .map(|t| {
            let [a, b, c] = triangle_vertices(mesh, t).map(|p| p - origin);
            a.dot(b.cross(c)) / 6.0
        })
        .sum()
}

/// Structural defects reported by [`check_consistency`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsistencyError {
    #[error("triangle {triangle} references vertex {index} out of {count}")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        count: usize,
    },
    #[error("triangle {0} repeats a vertex")]
    DegenerateTriangle(usize),
    #[error("triangles {0} and {1} are identical")]
    DuplicateTriangle(usize, usize),
    #[error("{normals} normals for {vertices} vertices")]
    NormalCountMismatch { normals: usize, vertices: usize },
}

/// Checks indices, repeated corners, duplicated triangles and the normal count.
pub fn check_consistency(mesh: &TriangleMesh) -> Result<(), ConsistencyError> {
    if !mesh.normals.is_empty() && mesh.normals.len() != mesh.vertices.len() {
        return Err(ConsistencyError::NormalCountMismatch {
            normals: mesh.normals.len(),
            vertices: mesh.vertices.len(),
        });
    }

    let mut seen: HashMap<[u32; 3], usize> = HashMap::new();
    for (t, tri) in mesh.triangles.iter().enumerate() {
        if let Some(&index) = tri.iter().find(|&&i| i as usize >= mesh.vertices.len()) {
            return Err(ConsistencyError::IndexOutOfRange {
                triangle: t,
                index,
                count: mesh.vertices.len(),
            });
        }
        if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
            return Err(ConsistencyError::DegenerateTriangle(t));
        }
        let mut key = *tri;
        key.sort_unstable();
        if let Some(&first) = seen.get(&key) {
            return Err(ConsistencyError::DuplicateTriangle(first, t));
        }
        seen.insert(key, t);
    }
    Ok(())
}
