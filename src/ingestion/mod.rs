pub mod obj_loader;
pub mod ply_loader;
pub mod stl_loader;

use chrono::Utc;
use glam::Vec3;
use tracing::{debug, warn};

use crate::error::{MeshProbeError, Result};
use crate::types::{BoundingBox, IndexedMesh, MeshModel};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MeshFormat {
    #[default]
    #[value(name = "obj")]
    Obj,
    #[value(name = "stl")]
    Stl,
    #[value(name = "ply")]
    Ply,
}

impl MeshFormat {
    /// Detect format from a storage key's extension (case-insensitive).
    pub fn from_key(key: &str) -> Result<Self> {
        let file = key.rsplit('/').next().unwrap_or(key);
        let ext = file
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "obj" => Ok(MeshFormat::Obj),
            "stl" => Ok(MeshFormat::Stl),
            "ply" => Ok(MeshFormat::Ply),
            _ => Err(MeshProbeError::Parse(format!(
                "Unsupported mesh format for key {key:?}"
            ))),
        }
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            MeshFormat::Obj => "obj",
            MeshFormat::Stl => "stl",
            MeshFormat::Ply => "ply",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MeshFormat::Obj => "OBJ",
            MeshFormat::Stl => "STL",
            MeshFormat::Ply => "PLY",
        }
    }
}

impl std::fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode a complete mesh file into a [`MeshModel`].
///
/// The format comes from `key`'s extension; the display name is the key's
/// file stem. Nothing is registered.
pub fn parse_mesh(id: &str, key: &str, bytes: &[u8]) -> Result<MeshModel> {
    let format = MeshFormat::from_key(key)?;
    debug!(id, key, format = %format, bytes = bytes.len(), "Decoding mesh");

    let mesh = match format {
        MeshFormat::Obj => obj_loader::parse_obj(bytes)?,
        MeshFormat::Stl => stl_loader::parse_stl(bytes)?,
        MeshFormat::Ply => ply_loader::parse_ply(bytes)?,
    };

    build_model(id, &MeshModel::name_from_key(key), &mesh)
}

/// Expand an indexed mesh into a fresh [`MeshModel`].
pub fn build_model(id: &str, name: &str, mesh: &IndexedMesh) -> Result<MeshModel> {
    let (vertices, normals, uvs) = expand_triangles(mesh)?;
    let bounding_box = BoundingBox::from_positions(&vertices);
    let now = Utc::now();

    debug!(
        id,
        triangles = mesh.triangle_count(),
        vertices = vertices.len() / 3,
        has_uvs = !uvs.is_empty(),
        "Built mesh model"
    );

    Ok(MeshModel {
        id: id.to_string(),
        name: name.to_string(),
        created: now,
        modified: now,
        triangle_count: mesh.triangle_count(),
        vertices,
        normals,
        uvs,
        bounding_box,
    })
}

/// Flatten an indexed mesh into per-triangle position, normal and UV streams.
///
/// Normals missing from the source become flat face normals. UVs are kept
/// only when every vertex has one.
pub fn expand_triangles(mesh: &IndexedMesh) -> Result<(Vec<f32>, Vec<f32>, Vec<f32>)> {
    let vertex_count = mesh.vertex_count();
    let use_normals = mesh.normals.len() == mesh.positions.len() && mesh.has_normals();
    let use_uvs = mesh.uvs.len() == vertex_count * 2 && mesh.has_uvs();

    if mesh.has_normals() && !use_normals {
        warn!(
            normals = mesh.normals.len(),
            positions = mesh.positions.len(),
            "Normal count does not match positions, recomputing face normals"
        );
    }

    let corner_count = mesh.triangle_count() * 3;
    let mut vertices = Vec::with_capacity(corner_count * 3);
    let mut normals = Vec::with_capacity(corner_count * 3);
    let mut uvs = Vec::with_capacity(if use_uvs { corner_count * 2 } else { 0 });

    for tri in mesh.indices.chunks_exact(3) {
        let corners = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if let Some(&bad) = corners.iter().find(|&&i| i >= vertex_count) {
            return Err(MeshProbeError::Parse(format!(
                "Face references vertex {bad} but only {vertex_count} vertices exist"
            )));
        }

        let p = corners.map(|i| position(&mesh.positions, i));
        vertices.extend(p.iter().flat_map(|v| v.to_array()));

        if use_normals {
            for &i in &corners {
                normals.extend_from_slice(&mesh.normals[i * 3..i * 3 + 3]);
            }
        } else {
            let n = face_normal(p[0], p[1], p[2]);
            for _ in 0..3 {
                normals.extend(n.to_array());
            }
        }

        if use_uvs {
            for &i in &corners {
                uvs.extend_from_slice(&mesh.uvs[i * 2..i * 2 + 2]);
            }
        }
    }

    Ok((vertices, normals, uvs))
}

fn position(positions: &[f32], i: usize) -> Vec3 {
    Vec3::from_slice(&positions[i * 3..i * 3 + 3])
}

/// Unit normal of a counter-clockwise triangle, zero when degenerate.
pub(crate) fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}
