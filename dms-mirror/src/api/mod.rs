//! HTTP API handlers for dms-mirror

use axum::body::Bytes;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::mirror::Mirror;
use crate::AppState;

pub mod gav_template;
pub mod health;
pub mod sync;
pub mod webhook;

pub use gav_template::resolve_gav_template;
pub use health::health_routes;
pub use sync::register_component_version_artifact;
pub use webhook::receive_dms_event;

/// `{"result": "Success"}`
pub fn success() -> Json<Value> {
    Json(json!({ "result": "Success" }))
}

/// Decode a JSON request body, reporting problems as 400
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Request body is empty".to_string()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}

/// Fresh worker context for one request
pub fn request_mirror(state: &AppState) -> ApiResult<Mirror> {
    Ok(Mirror::connect(state.shared.clone(), state.factory.as_ref())?)
}
