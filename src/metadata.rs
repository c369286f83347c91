//! Opaque JSON metadata stored next to a mesh object as
//! `<file_key>.metadata.json`.

use serde_json::Value;
use tracing::{debug, info};

use crate::error::Result;
use crate::store::BlobStore;

const METADATA_SUFFIX: &str = ".metadata.json";

/// Sibling key holding metadata for `file_key`.
pub fn metadata_key(file_key: &str) -> String {
    format!("{file_key}{METADATA_SUFFIX}")
}

/// Metadata for `file_key`, or `None` when no sibling object exists.
///
/// Any failure other than absence propagates.
pub fn get_file_metadata(store: &dyn BlobStore, file_key: &str) -> Result<Option<Value>> {
    let key = metadata_key(file_key);
    let bytes = match store.get(&key) {
        Ok(bytes) => bytes,
        Err(e) if e.is_not_found() => {
            debug!(key = %key, "No metadata object");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

/// Create or replace the metadata for `file_key`.
pub fn set_file_metadata(store: &dyn BlobStore, file_key: &str, metadata: &Value) -> Result<()> {
    let key = metadata_key(file_key);
    let body = serde_json::to_vec(metadata)?;
    store.put(&key, &body)?;
    info!(key = %key, bytes = body.len(), "Stored metadata");
    Ok(())
}
