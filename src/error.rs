use std::io;

use crate::store::StoreError;

/// All error types for mesh ingestion and analysis.
#[derive(thiserror::Error, Debug)]
pub enum MeshProbeError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] StoreError),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Model {id} not found or could not be loaded: {source}")]
    ModelNotFound {
        id: String,
        #[source]
        source: Box<MeshProbeError>,
    },
    #[error("Transform error: {0}")]
    Transform(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl MeshProbeError {
    /// Model absent from the registry with nothing underneath it.
    pub fn not_loaded(id: &str) -> Self {
        MeshProbeError::ModelNotFound {
            id: id.to_string(),
            source: Box::new(MeshProbeError::Config(format!(
                "model {id} is not loaded in the registry"
            ))),
        }
    }

    /// Stable machine-readable error category.
    pub fn kind(&self) -> &'static str {
        match self {
            MeshProbeError::Fetch(_) => "fetch",
            MeshProbeError::Parse(_) => "parse",
            MeshProbeError::ModelNotFound { .. } => "model_not_found",
            MeshProbeError::Transform(_) => "transform",
            MeshProbeError::Config(_) => "config",
            MeshProbeError::Serialization(_) => "serialization",
            MeshProbeError::Io(_) => "io",
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MeshProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_strings() {
        let e = MeshProbeError::Parse("bad token".into());
        assert_eq!(e.to_string(), "Parse error: bad token");

        let e = MeshProbeError::Transform("non-finite scale".into());
        assert_eq!(e.to_string(), "Transform error: non-finite scale");

        let e = MeshProbeError::Config("no store".into());
        assert_eq!(e.to_string(), "Config error: no store");

        let e = MeshProbeError::Fetch(StoreError::NotFound {
            key: "part1.obj".into(),
        });
        assert_eq!(e.to_string(), "Fetch error: object not found: part1.obj");
    }

    #[test]
    fn model_not_found_wraps_cause() {
        let e = MeshProbeError::ModelNotFound {
            id: "part9".into(),
            source: Box::new(MeshProbeError::Parse("unexpected token".into())),
        };
        let msg = e.to_string();
        assert!(msg.contains("part9"));
        assert!(msg.contains("unexpected token"));
        assert_eq!(e.kind(), "model_not_found");
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn not_loaded_mentions_id() {
        let e = MeshProbeError::not_loaded("gear");
        assert_eq!(e.kind(), "model_not_found");
        assert!(e.to_string().contains("gear"));
    }

    #[test]
    fn from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file missing");
        let e: MeshProbeError = io_err.into();
        assert!(matches!(e, MeshProbeError::Io(_)));
        assert_eq!(e.kind(), "io");
        assert!(e.to_string().contains("file missing"));
    }
}
