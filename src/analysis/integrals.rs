use glam::Vec3;

/// Whole-mesh sums over an expanded triangle stream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Integrals {
    /// Sum of signed tetrahedron volumes against the origin.
    pub signed_volume: f64,
    /// Sum of unsigned triangle areas.
    pub surface_area: f64,
}

/// Accumulate volume and area over consecutive triangles.
///
/// Each triangle `(a, b, c)` contributes `a · (b × c) / 6` to the signed
/// volume and `|(b - a) × (c - a)| / 2` to the area. Sums run in f64.
pub fn integrate(corners: &[Vec3]) -> Integrals {
    let mut out = Integrals::default();

    for tri in corners.chunks_exact(3) {
        let a = tri[0].as_dvec3();
        let b = tri[1].as_dvec3();
        let c = tri[2].as_dvec3();

        out.signed_volume += a.dot(b.cross(c)) / 6.0;
        out.surface_area += (b - a).cross(c - a).length() * 0.5;
    }

    out
}
