use tracing::debug;

use crate::error::{MeshProbeError, Result};
use crate::types::IndexedMesh;

/// Decode an in-memory OBJ file into an `IndexedMesh`.
///
/// Polygons are fan-triangulated and `v`/`vt`/`vn` are unified into a single
/// index. Only the first object that has faces is returned. `mtllib`
/// references are ignored.
pub fn parse_obj(bytes: &[u8]) -> Result<IndexedMesh> {
    let mut reader = bytes;
    let (models, _materials) = tobj::load_obj_buf(&mut reader, &tobj::GPU_LOAD_OPTIONS, |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(|e| MeshProbeError::Parse(format!("Failed to parse OBJ: {e}")))?;

    debug!(model_count = models.len(), "Decoded OBJ objects");

    let model_count = models.len();
    let model = models
        .into_iter()
        .find(|m| !m.mesh.indices.is_empty())
        .ok_or_else(|| MeshProbeError::Parse("OBJ contains no mesh object".into()))?;

    if model_count > 1 {
        debug!(
            object = %model.name,
            skipped = model_count - 1,
            "Using first OBJ object with faces"
        );
    }

    Ok(convert_mesh(model.mesh))
}

/// Convert a `tobj::Mesh` into our `IndexedMesh`.
fn convert_mesh(mesh: tobj::Mesh) -> IndexedMesh {
    IndexedMesh {
        positions: mesh.positions,
        normals: mesh.normals,
        uvs: mesh.texcoords,
        indices: mesh.indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
";

    #[test]
    fn convert_mesh_basic() {
        let mesh = tobj::Mesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            texcoords: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            indices: vec![0, 1, 2],
            vertex_color: vec![],
            face_arities: vec![],
            texcoord_indices: vec![],
            normal_indices: vec![],
            material_id: Some(0),
        };

        let indexed = convert_mesh(mesh);
        assert_eq!(indexed.vertex_count(), 3);
        assert_eq!(indexed.triangle_count(), 1);
        assert!(indexed.has_normals());
        assert!(indexed.has_uvs());
    }

    #[test]
    fn parse_triangle_with_attributes() {
        let mesh = parse_obj(TRIANGLE.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.normals.len(), 9);
        assert_eq!(mesh.uvs.len(), 6);
        // UVs are kept as written, no V flip
        assert_eq!(&mesh.uvs[2..4], &[1.0, 0.0]);
    }

    #[test]
    fn quad_is_fan_triangulated() {
        let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let mesh = parse_obj(obj.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert!(!mesh.has_normals());
    }

    #[test]
    fn first_object_with_faces_wins() {
        let obj = "\
o first
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o second
v 0 0 1
v 1 0 1
v 0 1 1
v 1 1 1
f 4 5 6
f 5 7 6
";
        let mesh = parse_obj(obj.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn malformed_vertex_is_parse_error() {
        let err = parse_obj(b"v 1.0 nope 2.0\nf 1 1 1\n").unwrap_err();
        assert!(matches!(err, MeshProbeError::Parse(_)));
        assert!(err.to_string().contains("OBJ"));
    }

    #[test]
    fn no_faces_is_parse_error() {
        let err = parse_obj(b"v 0 0 0\nv 1 0 0\n").unwrap_err();
        assert!(err.to_string().contains("no mesh object"));

        let err = parse_obj(b"").unwrap_err();
        assert!(matches!(err, MeshProbeError::Parse(_)));
    }

    #[test]
    fn mtllib_reference_is_ignored() {
        let obj = format!("mtllib missing.mtl\nusemtl steel\n{TRIANGLE}");
        let mesh = parse_obj(obj.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
    }
}
