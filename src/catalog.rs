//! Model catalog listing.
//!
//! Every object in the store produces one entry. Keys that carry the mesh
//! extension have it stripped; any other key is passed through untouched.

use tracing::debug;

use crate::error::Result;
use crate::ingestion::MeshFormat;
use crate::store::{BlobStore, ObjectInfo};
use crate::types::CatalogEntry;

/// List every object under `prefix` as a catalog entry.
pub fn list_models(store: &dyn BlobStore, prefix: &str, format: MeshFormat) -> Result<Vec<CatalogEntry>> {
    let objects = store.list(prefix)?;
    debug!(prefix, objects = objects.len(), "Listed store objects");
    Ok(objects
        .iter()
        .map(|object| catalog_entry(object, format))
        .collect())
}

/// Derive a catalog entry from one listing record.
pub fn catalog_entry(object: &ObjectInfo, format: MeshFormat) -> CatalogEntry {
    let suffix = format!(".{}", format.extension());
    let id = object
        .key
        .strip_suffix(suffix.as_str())
        .unwrap_or(&object.key)
        .to_string();
    let file = object.key.rsplit('/').next().unwrap_or(&object.key);
    let name = file.strip_suffix(suffix.as_str()).unwrap_or(file).to_string();

    CatalogEntry {
        id,
        name,
        created: object.last_modified,
        modified: object.last_modified,
    }
}
