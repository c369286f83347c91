//! STL (stereolithography) decoding, binary and ASCII.
//!
//! Binary layout: an 80-byte header, a little-endian `u32` facet count, then
//! 50 bytes per facet (normal, three vertices, `u16` attribute count). A
//! buffer is treated as binary when its length matches that layout exactly,
//! which also covers binary files whose header happens to start with
//! `solid`. Anything else starting with `solid` is read as ASCII.

use glam::Vec3;
use tracing::debug;

use crate::error::{MeshProbeError, Result};
use crate::types::IndexedMesh;

use super::face_normal;

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Size of one triangle in binary STL (normal + 3 vertices + attribute).
const TRIANGLE_SIZE: usize = 50;

/// Decode an in-memory STL file.
///
/// Every facet becomes three fresh vertices with sequential indices. The
/// stored facet normal is used for all three corners unless it is zero or
/// non-finite, in which case it is recomputed from the winding.
pub fn parse_stl(bytes: &[u8]) -> Result<IndexedMesh> {
    if let Some(count) = binary_facet_count(bytes) {
        return parse_binary(bytes, count);
    }

    let head = &bytes[..bytes.len().min(HEADER_SIZE)];
    if String::from_utf8_lossy(head).trim_start().starts_with("solid") {
        return parse_ascii(bytes);
    }

    if bytes.len() < HEADER_SIZE + 4 {
        return Err(MeshProbeError::Parse(format!(
            "STL too small: {} bytes",
            bytes.len()
        )));
    }

    let declared = read_u32(&bytes[HEADER_SIZE..]) as usize;
    Err(MeshProbeError::Parse(format!(
        "Binary STL declares {declared} facets ({} bytes) but buffer is {} bytes",
        HEADER_SIZE + 4 + declared * TRIANGLE_SIZE,
        bytes.len()
    )))
}

/// Facet count when `bytes` has exactly the binary STL length.
fn binary_facet_count(bytes: &[u8]) -> Option<usize> {
    if bytes.len() < HEADER_SIZE + 4 {
        return None;
    }
    let count = read_u32(&bytes[HEADER_SIZE..]) as usize;
    let expected = count
        .checked_mul(TRIANGLE_SIZE)
        .and_then(|n| n.checked_add(HEADER_SIZE + 4))?;
    (expected == bytes.len()).then_some(count)
}

fn read_u32(buf: &[u8]) -> u32 {
    u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
}

/// Read a vector from 12 bytes (3 little-endian f32s).
fn read_vec3(buf: &[u8]) -> Vec3 {
    let x = f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let y = f32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let z = f32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
    Vec3::new(x, y, z)
}

fn parse_binary(bytes: &[u8], count: usize) -> Result<IndexedMesh> {
    debug!(facets = count, "Decoding binary STL");
    let mut builder = SoupBuilder::with_capacity(count);

    for facet in bytes[HEADER_SIZE + 4..].chunks_exact(TRIANGLE_SIZE) {
        let normal = read_vec3(&facet[0..12]);
        let a = read_vec3(&facet[12..24]);
        let b = read_vec3(&facet[24..36]);
        let c = read_vec3(&facet[36..48]);
        builder.push(normal, [a, b, c]);
    }

    Ok(builder.finish())
}

fn parse_ascii(bytes: &[u8]) -> Result<IndexedMesh> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| MeshProbeError::Parse(format!("ASCII STL is not valid UTF-8: {e}")))?;

    let mut builder = SoupBuilder::with_capacity(0);
    let mut normal: Option<Vec3> = None;
    let mut corners: Vec<Vec3> = Vec::with_capacity(3);

    for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword {
            "solid" | "endsolid" | "outer" | "endloop" => {}
            "facet" => {
                if normal.is_some() {
                    return Err(stl_syntax(line_no, "nested facet"));
                }
                if tokens.next() != Some("normal") {
                    return Err(stl_syntax(line_no, "expected 'facet normal'"));
                }
                normal = Some(parse_vec3(&mut tokens, line_no)?);
                corners.clear();
            }
            "vertex" => {
                if normal.is_none() {
                    return Err(stl_syntax(line_no, "vertex outside facet"));
                }
                corners.push(parse_vec3(&mut tokens, line_no)?);
            }
            "endfacet" => {
                let Some(n) = normal.take() else {
                    return Err(stl_syntax(line_no, "endfacet without facet"));
                };
                let &[a, b, c] = corners.as_slice() else {
                    return Err(stl_syntax(
                        line_no,
                        &format!("facet has {} vertices, expected 3", corners.len()),
                    ));
                };
                builder.push(n, [a, b, c]);
            }
            other => {
                return Err(stl_syntax(line_no, &format!("unexpected token '{other}'")));
            }
        }
    }

    if normal.is_some() {
        return Err(MeshProbeError::Parse(
            "ASCII STL ends inside an unterminated facet".into(),
        ));
    }

    let mesh = builder.finish();
    debug!(facets = mesh.triangle_count(), "Decoded ASCII STL");
    Ok(mesh)
}

fn parse_vec3<'a>(tokens: &mut impl Iterator<Item = &'a str>, line_no: usize) -> Result<Vec3> {
    let mut v = [0.0f32; 3];
    for slot in &mut v {
        let token = tokens
            .next()
            .ok_or_else(|| stl_syntax(line_no, "expected three coordinates"))?;
        *slot = token
            .parse()
            .map_err(|_| stl_syntax(line_no, &format!("invalid number '{token}'")))?;
    }
    Ok(Vec3::from_array(v))
}

fn stl_syntax(line_no: usize, msg: &str) -> MeshProbeError {
    MeshProbeError::Parse(format!("ASCII STL line {line_no}: {msg}"))
}

/// Accumulates an un-indexed triangle soup with sequential indices.
struct SoupBuilder {
    mesh: IndexedMesh,
}

impl SoupBuilder {
    fn with_capacity(facets: usize) -> Self {
        Self {
            mesh: IndexedMesh {
                positions: Vec::with_capacity(facets * 9),
                normals: Vec::with_capacity(facets * 9),
                uvs: Vec::new(),
                indices: Vec::with_capacity(facets * 3),
            },
        }
    }

    fn push(&mut self, normal: Vec3, [a, b, c]: [Vec3; 3]) {
        let n = if normal.is_finite() && normal.length_squared() > 0.0 {
            normal.normalize()
        } else {
            face_normal(a, b, c)
        };

        let base = self.mesh.vertex_count() as u32;
        for p in [a, b, c] {
            self.mesh.positions.extend(p.to_array());
            self.mesh.normals.extend(n.to_array());
        }
        self.mesh.indices.extend([base, base + 1, base + 2]);
    }

    fn finish(self) -> IndexedMesh {
        self.mesh
    }
}
