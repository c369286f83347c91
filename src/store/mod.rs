//! Blob storage collaborators.
//!
//! The processor only needs three things from object storage: fetch a whole
//! object, write a whole object, and list keys with their size and
//! modification time. Keys are `/`-separated relative paths.

pub mod fs;
pub mod memory;

use std::io;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

/// Failures raised by a [`BlobStore`].
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("object not found: {key}")]
    NotFound { key: String },
    #[error("failed to access object {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid object key: {0:?}")]
    InvalidKey(String),
}

impl StoreError {
    /// Whether the object simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Listing metadata for one stored object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Whole-object blob storage.
pub trait BlobStore: Send + Sync {
    /// Fetch the full content of `key`.
    fn get(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Create or replace `key` with `data`.
    fn put(&self, key: &str, data: &[u8]) -> StoreResult<()>;

    /// List every object whose key starts with `prefix`, sorted by key.
    fn list(&self, prefix: &str) -> StoreResult<Vec<ObjectInfo>>;
}

/// Reject keys that are empty, absolute, or escape the store root.
pub(crate) fn validate_key(key: &str) -> StoreResult<()> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key
            .split('/')
            .any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
