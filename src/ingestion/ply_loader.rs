use std::io::BufReader;

use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};
use tracing::debug;

use crate::error::{MeshProbeError, Result};
use crate::types::IndexedMesh;

/// Decode an in-memory PLY file (ASCII or binary) into an `IndexedMesh`.
pub fn parse_ply(bytes: &[u8]) -> Result<IndexedMesh> {
    let mut reader = BufReader::new(bytes);

    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| MeshProbeError::Parse(format!("Failed to parse PLY: {e}")))?;

    let vertices = ply
        .payload
        .get("vertex")
        .ok_or_else(|| MeshProbeError::Parse("PLY file missing 'vertex' element".into()))?;

    debug!(vertex_count = vertices.len(), "Parsing PLY vertices");

    let first = vertices.first();
    let has_normals = first.is_some_and(|v| v.contains_key("nx"));
    let uv_keys = first.and_then(|v| {
        [("u", "v"), ("s", "t"), ("texture_u", "texture_v")]
            .into_iter()
            .find(|(u, _)| v.contains_key(*u))
    });

    let mut positions = Vec::with_capacity(vertices.len() * 3);
    let mut normals = Vec::with_capacity(if has_normals { vertices.len() * 3 } else { 0 });
    let mut uvs = Vec::with_capacity(if uv_keys.is_some() { vertices.len() * 2 } else { 0 });

    for vertex in vertices {
        positions.push(get_float_property(vertex, "x")?);
        positions.push(get_float_property(vertex, "y")?);
        positions.push(get_float_property(vertex, "z")?);

        if has_normals {
            normals.push(get_float_property(vertex, "nx")?);
            normals.push(get_float_property(vertex, "ny")?);
            normals.push(get_float_property(vertex, "nz")?);
        }

        if let Some((u, v)) = uv_keys {
            uvs.push(get_float_property(vertex, u)?);
            uvs.push(get_float_property(vertex, v)?);
        }
    }

    let mut indices = Vec::new();
    if let Some(faces) = ply.payload.get("face") {
        debug!(face_count = faces.len(), "Parsing PLY faces");
        for face in faces {
            let face_indices = get_index_list(face)?;
            // Fan-triangulate polygons with >3 vertices
            if face_indices.len() >= 3 {
                for i in 1..face_indices.len() - 1 {
                    indices.push(face_indices[0]);
                    indices.push(face_indices[i]);
                    indices.push(face_indices[i + 1]);
                }
            }
        }
    }

    Ok(IndexedMesh {
        positions,
        normals,
        uvs,
        indices,
    })
}

/// Extract a float property, handling the integer and float scalar types.
fn get_float_property(element: &DefaultElement, key: &str) -> Result<f32> {
    let prop = element
        .get(key)
        .ok_or_else(|| MeshProbeError::Parse(format!("PLY vertex missing property '{key}'")))?;

    match prop {
        Property::Float(v) => Ok(*v),
        Property::Double(v) => Ok(*v as f32),
        Property::Int(v) => Ok(*v as f32),
        Property::Short(v) => Ok(*v as f32),
        Property::UInt(v) => Ok(*v as f32),
        Property::UShort(v) => Ok(*v as f32),
        Property::Char(v) => Ok(*v as f32),
        Property::UChar(v) => Ok(*v as f32),
        _ => Err(MeshProbeError::Parse(format!(
            "PLY property '{key}' has unsupported type"
        ))),
    }
}

/// Extract the index list from a face element.
fn get_index_list(face: &DefaultElement) -> Result<Vec<u32>> {
    let key = if face.contains_key("vertex_indices") {
        "vertex_indices"
    } else {
        "vertex_index"
    };

    let prop = face
        .get(key)
        .ok_or_else(|| MeshProbeError::Parse("PLY face missing vertex_indices property".into()))?;

    match prop {
        Property::ListInt(v) => Ok(v.iter().map(|&i| i as u32).collect()),
        Property::ListUInt(v) => Ok(v.clone()),
        Property::ListUChar(v) => Ok(v.iter().map(|&i| i as u32).collect()),
        Property::ListShort(v) => Ok(v.iter().map(|&i| i as u32).collect()),
        Property::ListUShort(v) => Ok(v.iter().map(|&i| i as u32).collect()),
        _ => Err(MeshProbeError::Parse(
            "PLY face vertex_indices has unsupported type".into(),
        )),
    }
}
