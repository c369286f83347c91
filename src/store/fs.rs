use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{validate_key, BlobStore, ObjectInfo, StoreError, StoreResult};

/// A directory on disk acting as a bucket.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |p, part| p.join(part)))
    }
}

fn map_io(key: &str, e: io::Error) -> StoreError {
    if e.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound {
            key: key.to_string(),
        }
    } else {
        StoreError::Io {
            key: key.to_string(),
            source: e,
        }
    }
}

impl BlobStore for FsBlobStore {
    fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let path = self.object_path(key)?;
        if path.is_dir() {
            return Err(StoreError::NotFound {
                key: key.to_string(),
            });
        }
        let data = fs::read(&path).map_err(|e| map_io(key, e))?;
        debug!(key, bytes = data.len(), "Read object");
        Ok(data)
    }

    fn put(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                key: key.to_string(),
                source: e,
            })?;
        }
        fs::write(&path, data).map_err(|e| StoreError::Io {
            key: key.to_string(),
            source: e,
        })?;
        debug!(key, bytes = data.len(), "Wrote object");
        Ok(())
    }

    fn list(&self, prefix: &str) -> StoreResult<Vec<ObjectInfo>> {
        let mut objects = Vec::new();
        match collect_objects(&self.root, "", &mut objects) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(root = %self.root.display(), "Store root missing, listing empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(StoreError::Io {
                    key: prefix.to_string(),
                    source: e,
                });
            }
        }
        objects.retain(|o| o.key.starts_with(prefix));
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}

/// Recursively walk `dir`, pushing one entry per regular file.
fn collect_objects(dir: &Path, key_prefix: &str, out: &mut Vec<ObjectInfo>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let key = if key_prefix.is_empty() {
            name.to_string()
        } else {
            format!("{key_prefix}/{name}")
        };

        let meta = entry.metadata()?;
        if meta.is_dir() {
            collect_objects(&entry.path(), &key, out)?;
        } else if meta.is_file() {
            let last_modified = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            out.push(ObjectInfo {
                key,
                size: meta.len(),
                last_modified,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_roundtrip_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(tmp.path());
        store.put("parts/bracket.obj", b"v 0 0 0\n").unwrap();
        assert_eq!(store.get("parts/bracket.obj").unwrap(), b"v 0 0 0\n");
        assert!(tmp.path().join("parts").join("bracket.obj").exists());
    }

    #[test]
    fn get_missing_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(tmp.path());
        let err = store.get("nope.obj").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn rejects_escaping_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(tmp.path().join("bucket"));
        assert!(matches!(
            store.get("../secret"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(
            store.put("/etc/passwd", b""),
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn list_recursive_sorted_with_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(tmp.path());
        store.put("b.obj", b"12345").unwrap();
        store.put("a.obj", b"1").unwrap();
        store.put("sub/c.stl", b"123").unwrap();

        let all = store.list("").unwrap();
        let keys: Vec<_> = all.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a.obj", "b.obj", "sub/c.stl"]);
        assert_eq!(all[1].size, 5);

        let sub = store.list("sub/").unwrap();
        assert_eq!(sub.len(), 1);
        assert_eq!(sub[0].key, "sub/c.stl");
    }

    #[test]
    fn list_missing_root_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(tmp.path().join("does-not-exist"));
        assert!(store.list("").unwrap().is_empty());
    }
}
