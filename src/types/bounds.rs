use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in 3-D.
///
/// All-zero when computed over an empty position buffer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    /// Scan interleaved `[x, y, z, ...]` positions and return their bounds.
    ///
    /// Trailing floats that do not form a whole vertex are ignored.
    pub fn from_positions(positions: &[f32]) -> BoundingBox {
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];

        for p in positions.chunks_exact(3) {
            for axis in 0..3 {
                let v = p[axis] as f64;
                if v < min[axis] {
                    min[axis] = v;
                }
                if v > max[axis] {
                    max[axis] = v;
                }
            }
        }

        if min[0] == f64::INFINITY {
            return BoundingBox::default();
        }

        BoundingBox { min, max }
    }
}
