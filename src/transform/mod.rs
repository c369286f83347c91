pub mod geometry;

use chrono::{DateTime, Duration, Utc};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MeshProbeError, Result};
use crate::types::{BoundingBox, MeshModel};

use geometry::{apply_rotation, apply_scale, apply_translation};

/// Optional scale, rotation and translation, applied in that order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Per-axis multiplicative factors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f32; 3]>,
    /// Per-axis angles in radians, applied X then Y then Z.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<[f32; 3]>,
    /// Per-axis additive offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate: Option<[f32; 3]>,
}

impl TransformOptions {
    /// No operation requested.
    pub fn is_empty(&self) -> bool {
        self.scale.is_none() && self.rotate.is_none() && self.translate.is_none()
    }

    /// Reject non-finite factors, angles or offsets. A zero scale factor is
    /// allowed and flattens the mesh onto a plane.
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("scale", self.scale),
            ("rotate", self.rotate),
            ("translate", self.translate),
        ] {
            if let Some(v) = value {
                if v.iter().any(|f| !f.is_finite()) {
                    return Err(MeshProbeError::Transform(format!(
                        "{label} values must be finite, got {v:?}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Produce a transformed copy of `model`.
///
/// `id`, `name`, `created`, `triangle_count` and `uvs` carry over; the
/// bounding box is recomputed and `modified` moves strictly forward.
pub fn apply_transform(model: &MeshModel, options: &TransformOptions) -> Result<MeshModel> {
    options.validate()?;

    let mut vertices = model.vertices.clone();
    let mut normals = model.normals.clone();

    if let Some(s) = options.scale {
        debug!(id = %model.id, scale = ?s, "Scaling");
        apply_scale(&mut vertices, &mut normals, Vec3::from_array(s));
    }

    if let Some(r) = options.rotate {
        debug!(id = %model.id, rotate = ?r, "Rotating");
        apply_rotation(&mut vertices, &mut normals, Vec3::from_array(r));
    }

    if let Some(t) = options.translate {
        debug!(id = %model.id, translate = ?t, "Translating");
        apply_translation(&mut vertices, Vec3::from_array(t));
    }

    let bounding_box = BoundingBox::from_positions(&vertices);

    Ok(MeshModel {
        modified: next_timestamp(model.modified),
        vertices,
        normals,
        bounding_box,
        ..model.clone()
    })
}

/// Current time, nudged past `previous` if the clock has not advanced.
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::nanoseconds(1)
    }
}
