use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::BoundingBox;

/// Decoded geometry as it comes out of a format loader.
///
/// All buffers are contiguous `Vec<f32>` / `Vec<u32>`; `normals` and `uvs`
/// are either empty or per-vertex, matching `positions`.
#[derive(Debug, Clone, Default)]
pub struct IndexedMesh {
    /// Interleaved positions: [x, y, z, x, y, z, ...]
    pub positions: Vec<f32>,
    /// Interleaved normals: [nx, ny, nz, ...] or empty
    pub normals: Vec<f32>,
    /// Interleaved UVs: [u, v, u, v, ...] or empty
    pub uvs: Vec<f32>,
    /// Triangle indices into the vertex buffers
    pub indices: Vec<u32>,
}

impl IndexedMesh {
    /// Number of vertices (positions / 3).
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles (indices / 3).
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether normals are present.
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Whether UV coordinates are present.
    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    /// Whether the mesh contains no geometry.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// One loaded mesh, as held by the model registry.
///
/// `vertices`, `normals` and `uvs` are an expanded per-triangle stream:
/// every three consecutive vertices form one triangle. `normals` always has
/// the same length as `vertices`; `uvs` is empty or two floats per vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshModel {
    pub id: String,
    pub name: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub triangle_count: usize,
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    pub uvs: Vec<f32>,
    pub bounding_box: BoundingBox,
}

impl MeshModel {
    /// Number of vertices in the expanded stream.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Raw native-endian bytes of the position buffer.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Display name for a storage key: the file name without its extension.
    pub fn name_from_key(key: &str) -> String {
        let file = key.rsplit('/').next().unwrap_or(key);
        match file.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => file.to_string(),
        }
    }
}
