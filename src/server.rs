//! HTTP surface over a shared [`ModelProcessor`].
//!
//! Core operations are synchronous, so every handler moves its work onto the
//! blocking pool and bounds it with the configured deadline.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::analysis::MeshAnalysis;
use crate::error::{MeshProbeError, Result};
use crate::processor::ModelProcessor;
use crate::store::StoreError;
use crate::tools::{self, ToolOutput, ToolRequest};
use crate::transform::TransformOptions;
use crate::types::{CatalogEntry, MeshModel};

#[derive(Clone)]
struct AppState {
    processor: Arc<ModelProcessor>,
    timeout: Duration,
}

/// Failure of one HTTP request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] MeshProbeError),
    #[error("request exceeded {}s deadline", .0.as_secs_f64())]
    Timeout(Duration),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(MeshProbeError::ModelNotFound { .. })
            | ApiError::Core(MeshProbeError::Fetch(StoreError::NotFound { .. })) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Core(MeshProbeError::Parse(_) | MeshProbeError::Transform(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Core(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Core(e) => e.kind(),
            ApiError::Timeout(_) => "timeout",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }
        let body = json!({ "error": self.to_string(), "kind": self.kind() });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Build the router. `timeout` bounds each request's blocking work.
pub fn router(processor: Arc<ModelProcessor>, timeout: Duration) -> Router {
    let state = AppState { processor, timeout };
    Router::new()
        .route("/models", get(list_models))
        .route("/models/{id}", get(get_model))
        .route("/models/{id}/analysis", get(analyze_model))
        .route("/models/{id}/vertices", get(model_vertices))
        .route("/models/{id}/modify", post(modify_model))
        .route("/metadata/{*key}", get(get_metadata).put(put_metadata))
        .route("/tools", post(call_tool))
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, processor: Arc<ModelProcessor>, timeout: Duration) -> Result<()> {
    let app = router(processor, timeout);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, timeout = ?timeout, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(%e, "Failed to install Ctrl-C handler");
            }
        })
        .await?;
    info!("Server stopped");
    Ok(())
}

/// Run `work` on the blocking pool under the request deadline.
async fn run_blocking<T, F>(state: &AppState, work: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&ModelProcessor) -> Result<T> + Send + 'static,
{
    let processor = Arc::clone(&state.processor);
    let task = tokio::task::spawn_blocking(move || work(&processor));
    match tokio::time::timeout(state.timeout, task).await {
        Err(_) => Err(ApiError::Timeout(state.timeout)),
        Ok(Err(join)) => Err(ApiError::Internal(join.to_string())),
        Ok(Ok(result)) => Ok(result?),
    }
}

async fn list_models(State(state): State<AppState>) -> ApiResult<Json<Vec<CatalogEntry>>> {
    run_blocking(&state, |p| p.list_models()).await.map(Json)
}

async fn get_model(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<MeshModel>> {
    run_blocking(&state, move |p| p.get_model(&id).map(|m| MeshModel::clone(&m)))
        .await
        .map(Json)
}

async fn analyze_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MeshAnalysis>> {
    run_blocking(&state, move |p| p.analyze_model(&id)).await.map(Json)
}

/// Position buffer as raw little-endian `f32` triples.
async fn model_vertices(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let (bytes, count) = run_blocking(&state, move |p| {
        let model = p.get_model(&id)?;
        let bytes = if cfg!(target_endian = "little") {
            model.vertex_bytes().to_vec()
        } else {
            model.vertices.iter().flat_map(|f| f.to_le_bytes()).collect()
        };
        Ok((bytes, model.vertex_count()))
    })
    .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::HeaderName::from_static("x-vertex-count"), count.to_string()),
        ],
        bytes,
    )
        .into_response())
}

async fn modify_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(options): Json<TransformOptions>,
) -> ApiResult<Json<MeshModel>> {
    run_blocking(&state, move |p| {
        p.modify_model(&id, &options).map(|m| MeshModel::clone(&m))
    })
    .await
    .map(Json)
}

async fn get_metadata(State(state): State<AppState>, Path(key): Path<String>) -> ApiResult<Json<Option<Value>>> {
    run_blocking(&state, move |p| p.get_file_metadata(&key)).await.map(Json)
}

async fn put_metadata(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(metadata): Json<Value>,
) -> ApiResult<Json<Value>> {
    run_blocking(&state, move |p| p.set_file_metadata(&key, &metadata)).await?;
    Ok(Json(json!({ "message": tools::METADATA_UPDATED })))
}

async fn call_tool(State(state): State<AppState>, Json(request): Json<ToolRequest>) -> ApiResult<Json<ToolOutput>> {
    run_blocking(&state, move |p| Ok(tools::dispatch(p, &request))).await.map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessorConfig;
    use crate::store::{BlobStore, MemoryBlobStore, ObjectInfo, StoreResult};
    use crate::test_support::UNIT_CUBE_OBJ;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn app() -> Router {
        let store = MemoryBlobStore::with_objects([("part1.obj", UNIT_CUBE_OBJ.as_bytes())]).unwrap();
        let processor = ModelProcessor::new(Arc::new(store), &ProcessorConfig::default());
        router(Arc::new(processor), Duration::from_secs(5))
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn json_body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn list_models_route() {
        let (status, body) = send(app(), Method::GET, "/models", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)[0]["id"], "part1");
    }

    #[tokio::test]
    async fn analysis_route() {
        let (status, body) = send(app(), Method::GET, "/models/part1/analysis", None).await;
        assert_eq!(status, StatusCode::OK);
        let value = json_body(&body);
        assert_eq!(value["triangleCount"], 12);
        assert_eq!(value["manifold"], true);
    }

    #[tokio::test]
    async fn unknown_model_is_404_with_kind() {
        let (status, body) = send(app(), Method::GET, "/models/ghost/analysis", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let value = json_body(&body);
        assert_eq!(value["kind"], "model_not_found");
        assert!(value["error"].as_str().unwrap().contains("ghost"));
    }

    #[tokio::test]
    async fn vertices_route_returns_le_floats() {
        let (status, body) = send(app(), Method::GET, "/models/part1/vertices", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.len(), 36 * 3 * 4);
        let first: Vec<f32> = body
            .chunks_exact(4)
            .take(3)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert!(first.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[tokio::test]
    async fn modify_route_requires_loaded_model() {
        let app = app();
        let translate = json!({ "translate": [1.0, 0.0, 0.0] });

        let (status, _) = send(app.clone(), Method::POST, "/models/part1/modify", Some(translate.clone())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(app.clone(), Method::GET, "/models/part1", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(app, Method::POST, "/models/part1/modify", Some(translate)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["boundingBox"]["max"][0], 2.0);
    }

    #[test]
    fn api_error_status_and_message() {
        let err = ApiError::from(MeshProbeError::not_loaded("part9"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains("part9"));

        let err = ApiError::from(MeshProbeError::Transform("scale must be finite".into()));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.kind(), "transform");
        assert_eq!(err.to_string(), "Transform error: scale must be finite");

        let err = ApiError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.to_string(), "request exceeded 1.5s deadline");

        let err = ApiError::Internal("worker panicked".into());
        let dyn_err: &dyn std::error::Error = &err;
        assert_eq!(dyn_err.to_string(), "internal error: worker panicked");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn zero_scale_flattens_over_http() {
        let app = app();
        send(app.clone(), Method::GET, "/models/part1", None).await;
        let (status, body) = send(
            app,
            Method::POST,
            "/models/part1/modify",
            Some(json!({ "scale": [0.0, 1.0, 1.0] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["boundingBox"]["max"][0], 0.0);
    }

    #[tokio::test]
    async fn metadata_routes() {
        let app = app();
        let (status, body) = send(app.clone(), Method::GET, "/metadata/parts/part1.obj", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), Value::Null);

        let (status, _) = send(
            app.clone(),
            Method::PUT,
            "/metadata/parts/part1.obj",
            Some(json!({ "rev": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(app, Method::GET, "/metadata/parts/part1.obj", None).await;
        assert_eq!(json_body(&body), json!({ "rev": 3 }));
    }

    #[tokio::test]
    async fn tools_route() {
        let (status, body) = send(
            app(),
            Method::POST,
            "/tools",
            Some(json!({ "tool": "analyze_model", "model_id": "ghost" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let output: ToolOutput = serde_json::from_slice(&body).unwrap();
        assert!(output.is_error);
        assert_eq!(output.error_kind.as_deref(), Some("model_not_found"));
    }

    struct SlowStore;

    impl BlobStore for SlowStore {
        fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
            std::thread::sleep(Duration::from_millis(500));
            Err(StoreError::NotFound { key: key.to_string() })
        }

        fn put(&self, _key: &str, _data: &[u8]) -> StoreResult<()> {
            Ok(())
        }

        fn list(&self, _prefix: &str) -> StoreResult<Vec<ObjectInfo>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn slow_request_times_out() {
        let processor = ModelProcessor::new(Arc::new(SlowStore), &ProcessorConfig::default());
        let app = router(Arc::new(processor), Duration::from_millis(20));
        let (status, body) = send(app, Method::GET, "/models/part1/analysis", None).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(json_body(&body)["kind"], "timeout");
    }
}
