//! Edge-adjacency manifold and watertight checks.
//!
//! The expanded stream carries no shared indices, so corners are welded by
//! exact position (with `-0.0 == 0.0`) before edges are counted. Each
//! undirected edge records how often it is walked in each direction.

use std::collections::HashMap;

use glam::Vec3;

/// Result of the edge-adjacency scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopologyReport {
    /// Distinct positions after welding.
    pub welded_vertices: usize,
    /// Distinct undirected edges.
    pub edge_count: usize,
    /// Edges used by exactly one triangle.
    pub boundary_edges: usize,
    /// Edges used by more than two triangles, or by two with the same direction.
    pub non_manifold_edges: usize,
    /// Triangles with two coincident corners, excluded from the edge map.
    pub degenerate_triangles: usize,
    /// Triangles that contributed edges.
    pub counted_triangles: usize,
}

impl TopologyReport {
    /// Every edge borders at most two triangles with opposite winding.
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edges == 0
    }

    /// Manifold, closed, and non-empty.
    pub fn is_watertight(&self) -> bool {
        self.is_manifold() && self.boundary_edges == 0 && self.counted_triangles > 0
    }
}

#[derive(Default)]
struct EdgeUse {
    /// Walked from the lower welded index to the higher one.
    forward: u32,
    backward: u32,
}

/// Scan consecutive corner triples and classify every edge.
pub fn check_topology(corners: &[Vec3]) -> TopologyReport {
    let mut welded: HashMap<[u32; 3], u32> = HashMap::new();
    let mut edges: HashMap<(u32, u32), EdgeUse> = HashMap::new();
    let mut report = TopologyReport::default();

    for tri in corners.chunks_exact(3) {
        let ids = [tri[0], tri[1], tri[2]].map(|p| {
            let next = welded.len() as u32;
            *welded.entry(position_key(p)).or_insert(next)
        });

        if ids[0] == ids[1] || ids[1] == ids[2] || ids[2] == ids[0] {
            report.degenerate_triangles += 1;
            continue;
        }
        report.counted_triangles += 1;

        for (from, to) in [(ids[0], ids[1]), (ids[1], ids[2]), (ids[2], ids[0])] {
            let entry = edges.entry((from.min(to), from.max(to))).or_default();
            if from < to {
                entry.forward += 1;
            } else {
                entry.backward += 1;
            }
        }
    }

    report.welded_vertices = welded.len();
    report.edge_count = edges.len();
    for edge in edges.values() {
        match (edge.forward, edge.backward) {
            (1, 0) | (0, 1) => report.boundary_edges += 1,
            (1, 1) => {}
            _ => report.non_manifold_edges += 1,
        }
    }

    report
}

fn position_key(p: Vec3) -> [u32; 3] {
    // Adding 0.0 folds -0.0 into +0.0
    [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()]
}
