//! API endpoint integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use third_eye::api::{ApiState, router};
use tower::ServiceExt;

mod common;
use common::{Harness, MockCamera, MockModel};

fn build_test_router(harness: &Harness) -> axum::Router {
    router(Arc::new(ApiState {
        controller: harness.handle.clone(),
    }))
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let harness = Harness::start(MockCamera::default(), MockModel::replying("unused"));
    let app = build_test_router(&harness);

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_status_snapshot() {
    let harness = Harness::start(MockCamera::default(), MockModel::replying("unused"));
    let app = build_test_router(&harness);

    let response = app.oneshot(get("/api/status")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["mode"], "navigation");
    assert_eq!(json["mode_label"], "Navigation Mode (Safety)");
    assert_eq!(json["running"], false);
    assert_eq!(json["guardian_contact"], "+1 555 0100");
    assert!(json["target_query"].is_null());
    assert!(json.get("frame").is_none());
}

#[tokio::test]
async fn test_typed_utterance_switches_mode() {
    let harness = Harness::start(MockCamera::default(), MockModel::replying("unused"));
    let app = build_test_router(&harness);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/utterance",
            r#"{"text":"find my keys"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["severity"], "success");
    assert_eq!(json["message"], "Command Accepted: Finding 'keys'");

    let json = body_json(app.oneshot(get("/api/status")).await.unwrap()).await;
    assert_eq!(json["mode"], "find_object");
    assert_eq!(json["target_query"], "keys");
}

#[tokio::test]
async fn test_blank_utterance_rejected() {
    let harness = Harness::start(MockCamera::default(), MockModel::replying("unused"));
    let app = build_test_router(&harness);

    let response = app
        .oneshot(json_request("POST", "/api/utterance", r#"{"text":"  "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_set_mode() {
    let harness = Harness::start(MockCamera::default(), MockModel::replying("unused"));
    let app = build_test_router(&harness);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/mode", r#"{"mode":"dance"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/mode",
            r#"{"mode":"find","target":"umbrella"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let display = harness.handle.display();
    assert_eq!(display.target_query.as_deref(), Some("umbrella"));
    assert_eq!(display.mode_label, "Find Specific Object");
}

#[tokio::test]
async fn test_alert_and_guardian() {
    let harness = Harness::start(MockCamera::default(), MockModel::replying("unused"));
    let app = build_test_router(&harness);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/guardian",
            r#"{"contact":"+1 555 0142"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/alert", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "EMERGENCY ALERT SENT!");
    assert_eq!(json["severity"], "error");

    let json = body_json(app.oneshot(get("/api/status")).await.unwrap()).await;
    assert_eq!(json["alert"]["to"], "+1 555 0142");
    assert_eq!(json["alert"]["status"], "200 OK (Delivered)");
    assert_eq!(json["alert"]["trigger"], "manual");
}

#[tokio::test]
async fn test_blank_guardian_rejected() {
    let harness = Harness::start(MockCamera::default(), MockModel::replying("unused"));
    let app = build_test_router(&harness);

    let response = app
        .oneshot(json_request("PUT", "/api/guardian", r#"{"contact":""}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_frame_and_audio_missing_before_scan() {
    let harness = Harness::start(MockCamera::default(), MockModel::replying("unused"));
    let app = build_test_router(&harness);

    let response = app.clone().oneshot(get("/api/frame")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/api/audio")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_frame_and_audio_after_scan() {
    let harness = Harness::start(MockCamera::default(), MockModel::replying("Door ahead."));
    let app = build_test_router(&harness);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/start", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    harness.wait_for(|d| d.artifact.is_some()).await;

    let response = app.clone().oneshot(get("/api/frame")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");

    let response = app.oneshot(get("/api/audio")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"ID3 fake mp3");
}

#[tokio::test(start_paused = true)]
async fn test_audio_missing_after_failed_analysis() {
    let harness = Harness::start(
        MockCamera::default(),
        MockModel::replying_once("Path is clear, walk forward.", "quota exceeded"),
    );
    let app = build_test_router(&harness);

    harness.handle.send(third_eye::Action::Start).await.unwrap();
    harness.wait_for(|d| d.iterations >= 2).await;

    let response = app.oneshot(get("/api/audio")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
