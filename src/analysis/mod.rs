//! Whole-mesh geometric invariants.
//!
//! Volume uses the signed tetrahedral decomposition against the origin,
//! which is exact for closed, consistently wound meshes wherever they sit
//! and still computed (but not meaningful) for open ones. The reported
//! volume is the absolute value of the sum.
//!
//! The vertex stream is read in groups of nine floats. A trailing group that
//! does not form a whole triangle is skipped and reported in
//! [`MeshAnalysis::ignored_floats`] rather than treated as an error.

pub mod integrals;
pub mod topology;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{BoundingBox, MeshModel};

pub use integrals::{integrate, Integrals};
pub use topology::{check_topology, TopologyReport};

/// Derived, never-stored analysis of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshAnalysis {
    pub triangle_count: usize,
    pub vertex_count: usize,
    pub bounding_box: BoundingBox,
    pub volume: f64,
    pub surface_area: f64,
    pub manifold: bool,
    pub water_tight: bool,
    pub boundary_edges: usize,
    pub non_manifold_edges: usize,
    pub degenerate_triangles: usize,
    pub ignored_floats: usize,
}

/// Compute volume, area, counts and topology flags for `model`.
pub fn analyze(model: &MeshModel) -> MeshAnalysis {
    let (corners, ignored_floats) = triangle_corners(&model.vertices);
    if ignored_floats > 0 {
        warn!(
            id = %model.id,
            ignored_floats,
            "Vertex stream is not a whole number of triangles, ignoring the remainder"
        );
    }

    let sums = integrate(corners);
    let topology = check_topology(corners);

    debug!(
        id = %model.id,
        triangles = corners.len() / 3,
        volume = sums.signed_volume,
        area = sums.surface_area,
        boundary_edges = topology.boundary_edges,
        non_manifold_edges = topology.non_manifold_edges,
        "Analyzed mesh"
    );

    MeshAnalysis {
        triangle_count: model.triangle_count,
        vertex_count: model.vertex_count(),
        bounding_box: model.bounding_box,
        volume: sums.signed_volume.abs(),
        surface_area: sums.surface_area,
        manifold: topology.is_manifold(),
        water_tight: topology.is_watertight(),
        boundary_edges: topology.boundary_edges,
        non_manifold_edges: topology.non_manifold_edges,
        degenerate_triangles: topology.degenerate_triangles,
        ignored_floats,
    }
}

/// View the leading whole triangles of a flat float stream as corners.
///
/// Returns the corners and the number of trailing floats left over.
pub fn triangle_corners(vertices: &[f32]) -> (&[Vec3], usize) {
    let whole = vertices.len() / 9 * 9;
    (bytemuck::cast_slice(&vertices[..whole]), vertices.len() - whole)
}
