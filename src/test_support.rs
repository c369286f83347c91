//! Shared fixtures for unit tests.

use crate::ingestion::parse_mesh;
use crate::types::MeshModel;

/// Unit cube from (0,0,0) to (1,1,1), quads wound counter-clockwise seen
/// from outside.
pub const UNIT_CUBE_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
f 1 4 3 2
f 5 6 7 8
f 1 2 6 5
f 4 8 7 3
f 1 5 8 4
f 2 3 7 6
";

/// The unit cube decoded into a model with the given id.
pub fn unit_cube(id: &str) -> MeshModel {
    parse_mesh(id, &format!("{id}.obj"), UNIT_CUBE_OBJ.as_bytes()).unwrap()
}

/// The unit cube with every vertex shifted by `offset`.
pub fn shifted_cube(id: &str, offset: [f32; 3]) -> MeshModel {
    let mut model = unit_cube(id);
    for p in model.vertices.chunks_exact_mut(3) {
        p[0] += offset[0];
        p[1] += offset[1];
        p[2] += offset[2];
    }
    model
}
