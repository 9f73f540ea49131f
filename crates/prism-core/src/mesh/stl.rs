//! STL file loading

use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use glam::Vec3;

use super::{MeshError, TriangleMesh, utils};

/// Load an STL file (ASCII or binary)
pub fn load_stl(path: impl AsRef<Path>) -> Result<TriangleMesh, MeshError> {
    let file = std::fs::File::open(path.as_ref()).map_err(|e| MeshError::Io(e.to_string()))?;
    load_stl_from_reader(&mut BufReader::new(file))
}

/// Load an STL from bytes
pub fn load_stl_from_bytes(data: &[u8]) -> Result<TriangleMesh, MeshError> {
    load_stl_from_reader(&mut Cursor::new(data))
}

fn load_stl_from_reader(reader: &mut (impl Read + Seek)) -> Result<TriangleMesh, MeshError> {
    let stl = stl_io::read_stl(reader).map_err(|e| MeshError::Parse(e.to_string()))?;
    if stl.faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    let vertices = stl
        .vertices
        .iter()
        .map(|v| Vec3::new(v[0], v[1], v[2]))
        .collect();
    let triangles = stl
        .faces
        .iter()
        .map(|f| f.vertices.map(|i| i as u32))
        .collect();

    // Stored facet normals are per face; shading wants per-vertex normals.
    let mut mesh = TriangleMesh::new(vertices, triangles);
    mesh.ensure_normals();
    Ok(mesh)
}

/// Write a mesh as binary STL
pub fn save_stl(mesh: &TriangleMesh, path: impl AsRef<Path>) -> Result<(), MeshError> {
    let triangles: Vec<stl_io::Triangle> = (0..mesh.triangle_count())
        .map(|t| {
            let [a, b, c] = utils::triangle_vertices(mesh, t);
            stl_io::Triangle {
                normal: stl_io::Normal::new(utils::triangle_normal(mesh, t).to_array()),
                vertices: [
                    stl_io::Vertex::new(a.to_array()),
                    stl_io::Vertex::new(b.to_array()),
                    stl_io::Vertex::new(c.to_array()),
                ],
            }
        })
        .collect();

    let mut file = std::fs::File::create(path.as_ref()).map_err(|e| MeshError::Io(e.to_string()))?;
    stl_io::write_stl(&mut file, triangles.iter()).map_err(|e| MeshError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::generate_box_mesh;

    #[test]
    fn test_stl_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.stl");
        let cube = generate_box_mesh([1.0, 1.0, 1.0]);
        save_stl(&cube, &path).unwrap();

        let loaded = load_stl(&path).unwrap();
        assert_eq!(loaded.triangle_count(), 12);
        // STL shares corner positions between faces
        assert_eq!(loaded.vertex_count(), 8);
        assert_eq!(loaded.normals.len(), 8);
    }

    #[test]
    fn test_stl_garbage() {
        assert!(load_stl_from_bytes(b"not an stl").is_err());
    }
}
