//! OBJ mesh file loading

use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

use glam::Vec3;

use super::{MeshError, TriangleMesh};

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// Load an OBJ file, merging all of its models into one mesh
pub fn load_obj(path: impl AsRef<Path>) -> Result<TriangleMesh, MeshError> {
    let file = std::fs::File::open(path.as_ref()).map_err(|e| MeshError::Io(e.to_string()))?;
    load_obj_from_reader(&mut BufReader::new(file))
}

/// Load an OBJ from bytes
pub fn load_obj_from_bytes(data: &[u8]) -> Result<TriangleMesh, MeshError> {
    load_obj_from_reader(&mut Cursor::new(data))
}

fn load_obj_from_reader(reader: &mut impl BufRead) -> Result<TriangleMesh, MeshError> {
    // Materials are ignored; objects are colored per render object.
    let (models, _materials) =
        tobj::load_obj_buf(reader, &load_options(), |_| Ok(Default::default()))
            .map_err(|e| MeshError::Parse(e.to_string()))?;

    let mut mesh = TriangleMesh::default();
    let mut has_normals = true;

    for model in &models {
        let offset = mesh.vertices.len() as u32;
        let source = &model.mesh;

        mesh.vertices.extend(
            source
                .positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2])),
        );

        if source.normals.len() == source.positions.len() {
            mesh.normals.extend(
                source
                    .normals
                    .chunks_exact(3)
                    .map(|n| Vec3::new(n[0], n[1], n[2])),
            );
        } else {
            has_normals = false;
        }

        mesh.triangles.extend(
            source
                .indices
                .chunks_exact(3)
                .map(|t| [offset + t[0], offset + t[1], offset + t[2]]),
        );
    }

    if mesh.triangles.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    if !has_normals {
        mesh.normals.clear();
    }
    mesh.ensure_normals();

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";

    #[test]
    fn test_load_obj_triangulates() {
        let mesh = load_obj_from_bytes(QUAD.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.normals.len(), 4);
        for n in &mesh.normals {
            assert!((n.z - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_load_obj_empty() {
        let err = load_obj_from_bytes(b"# nothing here\n").unwrap_err();
        assert!(matches!(err, MeshError::EmptyMesh));
    }

    #[test]
    fn test_load_obj_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.obj");
        std::fs::write(&path, QUAD).unwrap();
        let mesh = crate::mesh::load_mesh(&path).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }
}
