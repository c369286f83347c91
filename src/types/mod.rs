pub mod bounds;
pub mod catalog;
pub mod mesh;

pub use bounds::BoundingBox;
pub use catalog::CatalogEntry;
pub use mesh::{IndexedMesh, MeshModel};
