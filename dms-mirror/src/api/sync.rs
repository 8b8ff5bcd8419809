//! On-demand synchronization of one component version

use axum::{body::Bytes, extract::State, Json};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, Instrument};

use super::{parse_body, request_mirror, success};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub component: String,
    pub version: String,
}

/// POST /register-component-version-artifact
pub async fn register_component_version_artifact(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let request: SyncRequest = parse_body(&body)?;
    info!("Sync requested for [{}:{}]", request.component, request.version);

    let span = tracing::info_span!("component", id = %request.component);
    let mirror = request_mirror(&state)?;
    mirror
        .process_version(&request.version, &request.component)
        .instrument(span)
        .await?;

    Ok(success())
}
