//! dms-mirror library - mirrors DMS build artifacts into a Maven repository
//!
//! Batch runs fan out one worker per configured component; the HTTP front
//! end processes DMS webhook events and on-demand version syncs.

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod clients;
pub mod error;
pub mod mirror;
pub mod settings;

pub use error::{ApiError, MirrorError, MirrorResult};

use clients::ClientFactory;
use mirror::SharedConfig;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub shared: SharedConfig,
    /// Builds the clients of each request's worker context
    pub factory: Arc<dyn ClientFactory>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(shared: SharedConfig, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            shared,
            factory,
            started_at: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::post;

    Router::new()
        .route("/dms-event", post(api::receive_dms_event))
        .route(
            "/register-component-version-artifact",
            post(api::register_component_version_artifact),
        )
        .route("/gav-template", post(api::resolve_gav_template))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
