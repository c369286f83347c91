//! In-memory id → model registry with lazy load-on-miss.
//!
//! Each id owns a slot behind its own mutex. Loads, fallback loads and
//! modifications of one id are serialized on that slot while different ids
//! proceed independently; the outer map lock is only held long enough to
//! find or create a slot. Concurrent misses on one id therefore trigger a
//! single fetch-and-parse, and the later callers observe its result.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::error::{MeshProbeError, Result};
use crate::ingestion::{parse_mesh, MeshFormat};
use crate::store::BlobStore;
use crate::transform::{apply_transform, TransformOptions};
use crate::types::MeshModel;

type Slot = Arc<Mutex<Option<Arc<MeshModel>>>>;

/// Process-lifetime cache of parsed models, backed by a blob store.
pub struct ModelRegistry {
    store: Arc<dyn BlobStore>,
    base_path: String,
    format: MeshFormat,
    slots: Mutex<HashMap<String, Slot>>,
}

impl ModelRegistry {
    pub fn new(store: Arc<dyn BlobStore>, base_path: impl Into<String>, format: MeshFormat) -> Self {
        Self {
            store,
            base_path: base_path.into(),
            format,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    pub fn format(&self) -> MeshFormat {
        self.format
    }

    /// Fetch, parse and register `path` under `id`, replacing any prior entry.
    pub fn load_model(&self, id: &str, path: &str) -> Result<Arc<MeshModel>> {
        let slot = self.slot(id);
        let mut entry = lock(&slot);
        match self.fetch_and_parse(id, path) {
            Ok(model) => {
                *entry = Some(Arc::clone(&model));
                Ok(model)
            }
            Err(e) => {
                drop(entry);
                self.release_if_empty(id, slot);
                Err(e)
            }
        }
    }

    /// Cached model for `id`, or a load of `<id>.<ext>` on a miss.
    ///
    /// A failed fallback load is reported as `ModelNotFound` wrapping the
    /// fetch or parse cause.
    pub fn get_or_load(&self, id: &str) -> Result<Arc<MeshModel>> {
        let slot = self.slot(id);
        let mut entry = lock(&slot);
        if let Some(model) = entry.as_ref() {
            debug!(id, "Registry hit");
            return Ok(Arc::clone(model));
        }

        let path = format!("{id}.{}", self.format.extension());
        debug!(id, path = %path, "Registry miss, loading by convention");
        match self.fetch_and_parse(id, &path) {
            Ok(model) => {
                *entry = Some(Arc::clone(&model));
                Ok(model)
            }
            Err(source) => {
                drop(entry);
                self.release_if_empty(id, slot);
                Err(MeshProbeError::ModelNotFound {
                    id: id.to_string(),
                    source: Box::new(source),
                })
            }
        }
    }

    /// Cached model for `id` without loading.
    pub fn get_model(&self, id: &str) -> Option<Arc<MeshModel>> {
        let slot = self.existing_slot(id)?;
        let entry = lock(&slot);
        entry.clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get_model(id).is_some()
    }

    /// Ids currently holding a model, sorted.
    pub fn ids(&self) -> Vec<String> {
        let slots: Vec<(String, Slot)> = lock(&self.slots)
            .iter()
            .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
            .collect();
        let mut ids: Vec<String> = slots
            .into_iter()
            .filter(|(_, slot)| lock(slot).is_some())
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids
    }

    /// Drop the entry for `id`, returning it if one was held.
    pub fn remove(&self, id: &str) -> Option<Arc<MeshModel>> {
        let slot = lock(&self.slots).remove(id)?;
        let mut entry = lock(&slot);
        entry.take()
    }

    /// Transform the registered model for `id` and store the result in its
    /// place. Never loads: an absent id is `ModelNotFound`.
    pub fn modify(&self, id: &str, options: &TransformOptions) -> Result<Arc<MeshModel>> {
        let slot = self
            .existing_slot(id)
            .ok_or_else(|| MeshProbeError::not_loaded(id))?;
        let mut entry = lock(&slot);
        let current = entry.as_ref().ok_or_else(|| MeshProbeError::not_loaded(id))?;

        let updated = Arc::new(apply_transform(current, options)?);
        info!(id, modified = %updated.modified, "Model modified");
        *entry = Some(Arc::clone(&updated));
        Ok(updated)
    }

    /// Storage key for a logical path: base path prefix and leading `/`
    /// removed.
    pub fn resolve_key<'a>(&self, path: &'a str) -> &'a str {
        let base = self.base_path.trim_matches('/');
        let mut key = path.trim_start_matches('/');
        if !base.is_empty() {
            if let Some(rest) = key.strip_prefix(base) {
                if rest.is_empty() || rest.starts_with('/') {
                    key = rest;
                }
            }
        }
        key.trim_start_matches('/')
    }

    fn fetch_and_parse(&self, id: &str, path: &str) -> Result<Arc<MeshModel>> {
        let key = self.resolve_key(path);
        let bytes = self.store.get(key)?;
        info!(id, key, bytes = bytes.len(), "Fetched mesh object");
        let model = parse_mesh(id, key, &bytes)?;
        info!(
            id,
            triangles = model.triangle_count,
            vertices = model.vertex_count(),
            "Registered model"
        );
        Ok(Arc::new(model))
    }

    fn slot(&self, id: &str) -> Slot {
        let mut slots = lock(&self.slots);
        Arc::clone(slots.entry(id.to_string()).or_default())
    }

    fn existing_slot(&self, id: &str) -> Option<Slot> {
        lock(&self.slots).get(id).map(Arc::clone)
    }

    /// Forget the slot for `id` after a failed load, unless it now holds a
    /// model or another caller is waiting on it. Slot handles are only cloned
    /// under the map lock, so the count is stable while it is held.
    fn release_if_empty(&self, id: &str, slot: Slot) {
        let mut slots = lock(&self.slots);
        let unused = slots.get(id).is_some_and(|held| Arc::ptr_eq(held, &slot))
            && Arc::strong_count(&slot) == 2
            && lock(&slot).is_none();
        if unused {
            slots.remove(id);
            debug!(id, "Released empty slot");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
