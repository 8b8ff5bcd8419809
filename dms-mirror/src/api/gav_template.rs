//! Resolved GAV template lookup

use axum::{body::Bytes, extract::State, Json};
use dms_mirror_common::config::ComponentConfig;
use serde::Deserialize;

use super::{parse_body, request_mirror};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GavTemplateRequest {
    #[serde(rename = "componentId", default)]
    pub component_id: Option<String>,
}

/// POST /gav-template
///
/// Returns the static or synthesized configuration of a component.
pub async fn resolve_gav_template(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<ComponentConfig>> {
    let request: GavTemplateRequest = parse_body(&body)?;
    let component = request
        .component_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("componentId is required".to_string()))?;

    let mirror = request_mirror(&state)?;
    match mirror.component_config(&component).await? {
        Some(config) => Ok(Json(config)),
        None => Err(ApiError::NotFound(format!("No GAV template for component [{}]", component))),
    }
}
