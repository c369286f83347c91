//! Tool-invocation surface.
//!
//! Requests arrive as a closed set of tagged JSON objects and every reply is
//! text: JSON on success, a plain message on failure. Failures also carry the
//! error's machine-readable kind so callers need not parse the message.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{MeshProbeError, Result};
use crate::processor::ModelProcessor;
use crate::transform::TransformOptions;

/// Reply sent when metadata has been stored.
pub const METADATA_UPDATED: &str = "Metadata updated successfully";

/// One tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolRequest {
    ListModels,
    #[serde(alias = "analyze_obj")]
    AnalyzeModel {
        model_id: String,
    },
    GetModel {
        model_id: String,
    },
    #[serde(alias = "modify_obj")]
    ModifyModel {
        model_id: String,
        #[serde(flatten)]
        options: TransformOptions,
    },
    LoadedModels,
    UnloadModel {
        model_id: String,
    },
    GetFileMetadata {
        file_key: String,
    },
    SetFileMetadata {
        file_key: String,
        metadata: Value,
    },
}

impl ToolRequest {
    pub fn name(&self) -> &'static str {
        match self {
            ToolRequest::ListModels => "list_models",
            ToolRequest::AnalyzeModel { .. } => "analyze_model",
            ToolRequest::GetModel { .. } => "get_model",
            ToolRequest::ModifyModel { .. } => "modify_model",
            ToolRequest::LoadedModels => "loaded_models",
            ToolRequest::UnloadModel { .. } => "unload_model",
            ToolRequest::GetFileMetadata { .. } => "get_file_metadata",
            ToolRequest::SetFileMetadata { .. } => "set_file_metadata",
        }
    }
}

/// Text reply of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
            error_kind: None,
        }
    }

    pub fn error(err: &MeshProbeError) -> Self {
        Self {
            text: err.to_string(),
            is_error: true,
            error_kind: Some(err.kind().to_string()),
        }
    }
}

/// Run one tool call against `processor`.
pub fn dispatch(processor: &ModelProcessor, request: &ToolRequest) -> ToolOutput {
    debug!(tool = request.name(), "Dispatching tool call");
    match run(processor, request) {
        Ok(text) => ToolOutput::text(text),
        Err(e) => {
            warn!(tool = request.name(), error = %e, "Tool call failed");
            ToolOutput::error(&e)
        }
    }
}

/// Decode a JSON request and run it. Undecodable input is reported as a
/// `serialization` error output.
pub fn dispatch_json(processor: &ModelProcessor, request: &str) -> ToolOutput {
    match serde_json::from_str::<ToolRequest>(request) {
        Ok(request) => dispatch(processor, &request),
        Err(e) => ToolOutput::error(&MeshProbeError::Serialization(e)),
    }
}

fn run(processor: &ModelProcessor, request: &ToolRequest) -> Result<String> {
    let text = match request {
        ToolRequest::ListModels => serde_json::to_string(&processor.list_models()?)?,
        ToolRequest::AnalyzeModel { model_id } => {
            serde_json::to_string(&processor.analyze_model(model_id)?)?
        }
        ToolRequest::GetModel { model_id } => {
            serde_json::to_string(processor.get_model(model_id)?.as_ref())?
        }
        ToolRequest::ModifyModel { model_id, options } => {
            serde_json::to_string(processor.modify_model(model_id, options)?.as_ref())?
        }
        ToolRequest::LoadedModels => serde_json::to_string(&processor.loaded_models())?,
        ToolRequest::UnloadModel { model_id } => {
            let unloaded = processor.unload_model(model_id);
            serde_json::to_string(&json!({ "modelId": model_id, "unloaded": unloaded }))?
        }
        ToolRequest::GetFileMetadata { file_key } => {
            serde_json::to_string(&processor.get_file_metadata(file_key)?)?
        }
        ToolRequest::SetFileMetadata { file_key, metadata } => {
            processor.set_file_metadata(file_key, metadata)?;
            METADATA_UPDATED.to_string()
        }
    };
    Ok(text)
}
