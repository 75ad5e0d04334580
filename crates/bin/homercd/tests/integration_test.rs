//! End-to-end smoke tests for the full homercd stack.
//!
//! Each test spins up the complete application (directory, virtual driver,
//! real axum router) and exercises the HTTP layer via
//! `tower::ServiceExt::oneshot` — no TCP port is bound.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use homerc_adapter_http_axum::router;
use homerc_adapter_http_axum::state::AppState;
use homerc_adapter_virtual::VirtualIntegration;
use homerc_app::{Directory, DirectoryConfig};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Build a fully-wired router with the virtual integration installed and a
/// remote `garage` host declared.
fn app() -> (axum::Router, Directory) {
    let directory = Directory::init(DirectoryConfig::default()).unwrap();
    directory
        .add_host("garage", Some("10.0.0.3:3000".to_string()))
        .unwrap();
    VirtualIntegration::new(Duration::from_millis(20))
        .install(&directory)
        .unwrap();
    (router::build(AppState::new(directory.clone())), directory)
}

async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let (app, _) = app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"OK");
}

// ---------------------------------------------------------------------------
// Hosts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_list_local_and_configured_hosts() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/api/hosts", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"local"));
    assert!(ids.contains(&"garage"));
}

// ---------------------------------------------------------------------------
// Resources and requests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_expose_virtual_resources() {
    let (app, _) = app();
    let uri = "/api/resources?pattern=local/virtual/*";
    let (status, body) = send(&app, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let uri = "/api/resources/local/virtual/temperature";
    let (status, body) = send(&app, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value_state"]["value"], 21.5);
    assert_eq!(body["writable"], false);
}

#[tokio::test]
async fn should_let_higher_priority_request_win() {
    let (app, _) = app();
    let (_, body) = send(
        &app,
        Method::PUT,
        "/api/requests/local/virtual/light",
        Some(json!({ "request": "1 #auto" })),
    )
    .await;
    assert_eq!(body["outcome"], "realized");

    let (_, body) = send(
        &app,
        Method::PUT,
        "/api/requests/local/virtual/light",
        Some(json!({ "request": "0 #ui *5" })),
    )
    .await;
    assert_eq!(body["outcome"], "realized");

    let (_, body) = send(&app, Method::GET, "/api/resources/local/virtual/light", None).await;
    assert_eq!(body["value_state"]["value"], false);
    assert_eq!(body["requests"].as_array().unwrap().len(), 2);

    let (_, body) = send(
        &app,
        Method::DELETE,
        "/api/requests/local/virtual/light?gid=ui",
        None,
    )
    .await;
    assert_eq!(body["outcome"], "realized");

    let (_, body) = send(&app, Method::GET, "/api/resources/local/virtual/light", None).await;
    assert_eq!(body["value_state"]["value"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn should_settle_shades_after_travel() {
    let (app, directory) = app();
    let (_, body) = send(
        &app,
        Method::PUT,
        "/api/requests/local/virtual/shades",
        Some(json!({ "request": "60" })),
    )
    .await;
    assert_eq!(body["outcome"], "busy");

    let uri = "local/virtual/shades".parse().unwrap();
    let mut settled = false;
    for _ in 0..100 {
        if directory.get_value_state(&uri).unwrap().is_valid() {
            settled = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(settled);

    let (_, body) = send(&app, Method::GET, "/api/resources/local/virtual/shades", None).await;
    assert_eq!(body["value_state"]["value"], 60.0);
}

#[tokio::test]
async fn should_reject_request_on_read_only_resource() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/requests/local/virtual/temperature",
        Some(json!({ "request": "30" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("not writable"));
}

#[tokio::test]
async fn should_return_not_found_for_unknown_resource() {
    let (app, _) = app();
    let (status, _) = send(&app, Method::GET, "/api/resources/local/virtual/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_purge_expired_request_on_gc() {
    let (app, directory) = app();
    send(
        &app,
        Method::PUT,
        "/api/requests/local/virtual/light",
        Some(json!({ "request": "1 #short -10ms" })),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let (status, body) = send(&app, Method::POST, "/api/gc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["purged"], 1);
    let detail = directory
        .resource_detail(&"local/virtual/light".parse().unwrap())
        .unwrap();
    assert!(detail.requests.is_empty());
}
