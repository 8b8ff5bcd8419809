//! Integration tests for the HTTP front end

mod helpers;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use dms_mirror::mirror::SharedConfig;
use dms_mirror::settings::DmsApiVersion;
use dms_mirror::{build_router, AppState};
use dms_mirror_common::config::{ComponentsConfig, GenericComponentTemplate};
use dms_mirror_common::models::{ArtifactInfo, CiTypeDms, DmsComponent};
use helpers::*;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method

fn resource(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/resources")
        .join(name)
}

/// Test helper: router over the fixture configuration and `backend`
fn setup_app(backend: &FakeBackend) -> axum::Router {
    let components = ComponentsConfig::load(&resource("config.json")).unwrap();
    let generic = GenericComponentTemplate::load_optional(&resource("gav_template_config.json")).unwrap();
    let shared = SharedConfig::new(test_settings(), components, generic);
    build_router(AppState::new(shared, Arc::new(backend.clone())))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(&FakeBackend::new(DmsApiVersion::V3));
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "dms-mirror");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].as_i64().unwrap() >= 0);
}

// =============================================================================
// Webhook
// =============================================================================

#[tokio::test]
async fn test_webhook_publish_mirrors_artifacts() {
    let backend = FakeBackend::new(DmsApiVersion::V3);
    backend.with(|w| {
        w.infos.insert("11".into(), ArtifactInfo::default());
        w.downloads.insert("11".into(), b"zipdata".to_vec());
    });
    let app = setup_app(&backend);

    let payload = json!({
        "type": "PUBLISH_COMPONENT_VERSION",
        "componentVersion": {"component": "comp", "version": "4.1"},
        "artifacts": [
            {"type": "distribution", "id": 11, "fileName": "tool-4.1-win64.zip"},
            {"type": "layer", "id": 12, "repositoryType": "DOCKER"}
        ]
    });
    let response = app.oneshot(post_json("/dms-event", payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await, json!({"result": "Success"}));
    assert_eq!(
        backend.registrations(),
        vec![Call::Register {
            coordinate: "com.example.tools:tool:4.1:zip:win64".into(),
            ci_type: "COMPCI".into(),
            depth: 0,
        }]
    );
}

#[tokio::test]
async fn test_webhook_unknown_event_type() {
    let backend = FakeBackend::new(DmsApiVersion::V3);
    let app = setup_app(&backend);

    let payload = json!({
        "type": "BOGUS",
        "componentVersion": {"component": "comp", "version": "1.0"},
        "artifacts": []
    });
    let response = app.oneshot(post_json("/dms-event", payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["result"].as_str().unwrap().contains("Unexpected event type [BOGUS]"));
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_webhook_missing_component_rejected_before_processing() {
    let backend = FakeBackend::new(DmsApiVersion::V3);
    let app = setup_app(&backend);

    let payload = json!({
        "type": "PUBLISH_COMPONENT_VERSION",
        "componentVersion": {"version": "1.0"},
        "artifacts": [{"type": "distribution", "id": 1, "fileName": "a-1.0.zip"}]
    });
    let response = app.oneshot(post_json("/dms-event", payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["result"].as_str().unwrap().contains("componentVersion.component"));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_webhook_processing_failure_is_400() {
    let backend = FakeBackend::new(DmsApiVersion::V3);
    let app = setup_app(&backend);

    // the detailed lookup needs an artifact id
    let payload = json!({
        "type": "PUBLISH_COMPONENT_VERSION",
        "componentVersion": {"component": "comp", "version": "1.0"},
        "artifacts": [{"type": "distribution", "fileName": "a-1.0.zip"}]
    });
    let response = app.oneshot(post_json("/dms-event", payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "PROCESSING_ERROR");
    assert!(backend.uploads().is_empty());
}

#[tokio::test]
async fn test_webhook_invalid_json() {
    let app = setup_app(&FakeBackend::new(DmsApiVersion::V3));
    let request = Request::builder()
        .method("POST")
        .uri("/dms-event")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// =============================================================================
// On-demand version sync
// =============================================================================

#[tokio::test]
async fn test_register_component_version_artifact() {
    let backend = FakeBackend::new(DmsApiVersion::V2);
    backend.with(|w| {
        w.artifacts.insert(
            ("comp".into(), "2.0".into()),
            vec![v2_artifact("documentation", "guide", "pdf", None)],
        );
        w.source_gavs.insert("documentation".into(), "org.src:guide:2.0:pdf".into());
        w.repository.insert("org.src:guide:2.0:pdf".into(), b"pdf".to_vec());
    });
    let app = setup_app(&backend);

    let response = app
        .oneshot(post_json(
            "/register-component-version-artifact",
            json!({"component": "comp", "version": "2.0"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        backend.registrations(),
        vec![Call::Register {
            coordinate: "com.example.docs:guide:2.0:pdf".into(),
            ci_type: "DOCS".into(),
            depth: 0,
        }]
    );
}

#[tokio::test]
async fn test_register_component_version_artifact_needs_version() {
    let app = setup_app(&FakeBackend::new(DmsApiVersion::V2));
    let response = app
        .oneshot(post_json(
            "/register-component-version-artifact",
            json!({"component": "comp"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// GAV template lookup
// =============================================================================

#[tokio::test]
async fn test_gav_template_static_component() {
    let app = setup_app(&FakeBackend::new(DmsApiVersion::V3));
    let response = app
        .oneshot(post_json("/gav-template", json!({"componentId": "legacy"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["ciType"], "LEGACYCI");
    assert_eq!(body["gavTemplates"]["distribution"], "${prefix}.legacy:\\$n:$v:$p");
    assert!(body.get("componentId").is_none());
}

#[tokio::test]
async fn test_gav_template_synthesized_component() {
    let backend = FakeBackend::new(DmsApiVersion::V3);
    backend.with(|w| {
        w.citypes.insert(
            "dyn".into(),
            CiTypeDms {
                dms_id: Some("dyn".into()),
                ci_type_id: Some("DYNCI".into()),
            },
        );
        w.components.push(DmsComponent {
            id: "dyn".into(),
            client_code: None,
        });
    });
    let app = setup_app(&backend);

    let response = app
        .oneshot(post_json("/gav-template", json!({"componentId": "dyn"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["ciType"], "DYNCI");
    assert_eq!(
        body["gavTemplates"]["distribution"],
        "${prefix}.DYNCI:$n:$v:$p$c_colon"
    );
    assert_eq!(body["gavTemplates"]["notes"], "${prefix}.release_notes:DYNCI:$v:$p");
}

#[tokio::test]
async fn test_gav_template_unknown_component() {
    let app = setup_app(&FakeBackend::new(DmsApiVersion::V3));
    let response = app
        .oneshot(post_json("/gav-template", json!({"componentId": "ghost"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_gav_template_missing_component_id() {
    let app = setup_app(&FakeBackend::new(DmsApiVersion::V3));
    let response = app
        .oneshot(post_json("/gav-template", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["result"].as_str().unwrap().contains("componentId"));
}
