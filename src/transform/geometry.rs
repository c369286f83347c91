use glam::{Quat, Vec3};

/// Scale positions per axis; normals take the inverse-transpose and are
/// renormalised.
///
/// The normal matrix is built from the cofactors of the scale, which match the
/// inverse-transpose up to a positive factor and stay finite when a factor is
/// zero.
pub fn apply_scale(positions: &mut [f32], normals: &mut [f32], factors: Vec3) {
    for p in positions.chunks_exact_mut(3) {
        let v = Vec3::from_slice(p) * factors;
        v.write_to_slice(p);
    }

    let cofactor = Vec3::new(
        factors.y * factors.z,
        factors.x * factors.z,
        factors.x * factors.y,
    );
    let normal_scale = if factors.x * factors.y * factors.z < 0.0 {
        -cofactor
    } else {
        cofactor
    };
    for n in normals.chunks_exact_mut(3) {
        let v = (Vec3::from_slice(n) * normal_scale).normalize_or_zero();
        v.write_to_slice(n);
    }
}

/// Rotation about the world X axis, then Y, then Z (radians).
pub fn rotation_xyz(angles: Vec3) -> Quat {
    Quat::from_rotation_z(angles.z) * Quat::from_rotation_y(angles.y) * Quat::from_rotation_x(angles.x)
}

/// Rotate positions and normals by `angles` in X, Y, Z order.
pub fn apply_rotation(positions: &mut [f32], normals: &mut [f32], angles: Vec3) {
    let q = rotation_xyz(angles);
    for buf in [positions, normals] {
        for p in buf.chunks_exact_mut(3) {
            let v = q * Vec3::from_slice(p);
            v.write_to_slice(p);
        }
    }
}

/// Offset every position. Normals are direction-only and stay untouched.
pub fn apply_translation(positions: &mut [f32], offset: Vec3) {
    for p in positions.chunks_exact_mut(3) {
        let v = Vec3::from_slice(p) + offset;
        v.write_to_slice(p);
    }
}
