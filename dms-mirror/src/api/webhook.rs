//! DMS webhook receiver

use axum::{body::Bytes, extract::State, Json};
use dms_mirror_common::events::DmsEvent;
use serde_json::Value;
use tracing::{info, Instrument};

use super::{parse_body, request_mirror, success};
use crate::error::{ApiResult, MirrorError};
use crate::AppState;

/// POST /dms-event
///
/// The payload is validated completely before any artifact is touched.
pub async fn receive_dms_event(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let payload: Value = parse_body(&body)?;
    let event = DmsEvent::from_payload(&payload).map_err(MirrorError::from)?;

    let component_version = event.component_version();
    info!(
        "DMS event [{}] for [{}:{}]",
        event.kind(),
        component_version.component,
        component_version.version
    );

    let span = tracing::info_span!("component", id = %component_version.component);
    let mirror = request_mirror(&state)?;
    mirror.process_webhook(&event).instrument(span).await?;

    Ok(success())
}
