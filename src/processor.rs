use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::analysis::{self, MeshAnalysis};
use crate::catalog;
use crate::config::ProcessorConfig;
use crate::error::Result;
use crate::ingestion::MeshFormat;
use crate::metadata;
use crate::registry::ModelRegistry;
use crate::store::{BlobStore, FsBlobStore};
use crate::transform::TransformOptions;
use crate::types::{CatalogEntry, MeshModel};

/// Outcome for one model in a batch analysis.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<MeshAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Facade over the store, registry, analyzer and transformer.
///
/// One instance is constructed at startup and shared by handle with every
/// caller; tests build their own over a [`crate::store::MemoryBlobStore`].
pub struct ModelProcessor {
    registry: ModelRegistry,
}

impl ModelProcessor {
    pub fn new(store: Arc<dyn BlobStore>, config: &ProcessorConfig) -> Self {
        Self {
            registry: ModelRegistry::new(store, config.base_path.clone(), config.format),
        }
    }

    /// Processor over a filesystem store rooted at `config.store_root`.
    pub fn from_config(config: &ProcessorConfig) -> Self {
        info!(root = %config.store_root.display(), format = %config.format, "Opening store");
        Self::new(Arc::new(FsBlobStore::new(config.store_root.clone())), config)
    }

    pub fn format(&self) -> MeshFormat {
        self.registry.format()
    }

    /// Every object in the store as a catalog entry.
    pub fn list_models(&self) -> Result<Vec<CatalogEntry>> {
        catalog::list_models(self.store(), "", self.format())
    }

    /// Fetch, parse and register `path` under `id`.
    pub fn load_model(&self, id: &str, path: &str) -> Result<Arc<MeshModel>> {
        self.registry.load_model(id, path)
    }

    /// Cached model, loading by convention on a miss.
    pub fn get_model(&self, id: &str) -> Result<Arc<MeshModel>> {
        self.registry.get_or_load(id)
    }

    pub fn analyze_model(&self, id: &str) -> Result<MeshAnalysis> {
        let model = self.registry.get_or_load(id)?;
        let analysis = analysis::analyze(&model);
        info!(
            id,
            triangles = analysis.triangle_count,
            volume = analysis.volume,
            water_tight = analysis.water_tight,
            "Analyzed model"
        );
        Ok(analysis)
    }

    pub fn modify_model(&self, id: &str, options: &TransformOptions) -> Result<Arc<MeshModel>> {
        self.registry.modify(id, options)
    }

    /// Ids currently held in the registry, sorted.
    pub fn loaded_models(&self) -> Vec<String> {
        self.registry.ids()
    }

    /// Evict `id` from the registry. Returns whether a model was held.
    pub fn unload_model(&self, id: &str) -> bool {
        let removed = self.registry.remove(id).is_some();
        if removed {
            info!(id, "Unloaded model");
        }
        removed
    }

    /// Analyze every catalog entry carrying the configured extension, in
    /// parallel. A failing model is reported in its item and does not stop
    /// the others.
    pub fn analyze_all(&self) -> Result<Vec<BatchItem>> {
        let start = Instant::now();
        let suffix = format!(".{}", self.format().extension());
        let ids: Vec<String> = self
            .store()
            .list("")?
            .into_iter()
            .filter_map(|object| object.key.strip_suffix(suffix.as_str()).map(str::to_string))
            .collect();

        let items: Vec<BatchItem> = ids
            .into_par_iter()
            .map(|id| match self.analyze_model(&id) {
                Ok(analysis) => BatchItem {
                    id,
                    analysis: Some(analysis),
                    error: None,
                },
                Err(e) => {
                    warn!(id = %id, error = %e, "Analysis failed");
                    BatchItem {
                        id,
                        analysis: None,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect();

        let failed = items.iter().filter(|item| item.error.is_some()).count();
        info!(
            models = items.len(),
            failed,
            elapsed = ?start.elapsed(),
            "Batch analysis complete"
        );
        Ok(items)
    }

    pub fn get_file_metadata(&self, file_key: &str) -> Result<Option<Value>> {
        metadata::get_file_metadata(self.store(), file_key)
    }

    pub fn set_file_metadata(&self, file_key: &str, value: &Value) -> Result<()> {
        metadata::set_file_metadata(self.store(), file_key, value)
    }

    fn store(&self) -> &dyn BlobStore {
        self.registry.store().as_ref()
    }
}
