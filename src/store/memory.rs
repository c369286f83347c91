use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};

use super::{validate_key, BlobStore, ObjectInfo, StoreError, StoreResult};

/// In-process blob store keyed by object name.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<BTreeMap<String, (Vec<u8>, DateTime<Utc>)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `(key, bytes)` pairs.
    pub fn with_objects<'a>(objects: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> StoreResult<Self> {
        let store = Self::new();
        for (key, data) in objects {
            store.put(key, data)?;
        }
        Ok(store)
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        validate_key(key)?;
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    fn put(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        validate_key(key)?;
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), (data.to_vec(), Utc::now()));
        Ok(())
    }

    fn list(&self, prefix: &str) -> StoreResult<Vec<ObjectInfo>> {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, (data, modified))| ObjectInfo {
                key: key.clone(),
                size: data.len() as u64,
                last_modified: *modified,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_lists_nothing() {
        let store = MemoryBlobStore::new();
        assert!(store.list("").unwrap().is_empty());
    }

    #[test]
    fn put_replaces_and_lists_in_order() {
        let store = MemoryBlobStore::with_objects([
            ("z.obj", b"zz".as_slice()),
            ("a.obj", b"a".as_slice()),
        ])
        .unwrap();
        store.put("a.obj", b"aaa").unwrap();

        let listing = store.list("").unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].key, "a.obj");
        assert_eq!(listing[0].size, 3);
        assert_eq!(listing[1].key, "z.obj");
    }

    #[test]
    fn prefix_filtering() {
        let store = MemoryBlobStore::with_objects([
            ("parts/a.obj", b"".as_slice()),
            ("parts/b.obj", b"".as_slice()),
            ("other.obj", b"".as_slice()),
        ])
        .unwrap();
        let listing = store.list("parts/").unwrap();
        assert_eq!(listing.len(), 2);
        assert!(listing.iter().all(|o| o.key.starts_with("parts/")));
    }

    #[test]
    fn missing_key_is_not_found() {
        let store = MemoryBlobStore::new();
        assert!(store.get("missing.obj").unwrap_err().is_not_found());
    }
}
