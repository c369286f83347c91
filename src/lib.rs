pub mod analysis;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod metadata;
pub mod processor;
pub mod registry;
#[cfg(feature = "server")]
pub mod server;
pub mod store;
pub mod tools;
pub mod transform;
pub mod types;

#[cfg(test)]
mod test_support;

pub use analysis::MeshAnalysis;
pub use config::{CliArgs, ProcessorConfig};
pub use error::{MeshProbeError, Result};
pub use ingestion::MeshFormat;
pub use processor::ModelProcessor;
pub use registry::ModelRegistry;
pub use store::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use tools::{ToolOutput, ToolRequest};
pub use transform::TransformOptions;
pub use types::{BoundingBox, CatalogEntry, MeshModel};
