//! HTTP-level tests for the grade handler route.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use masterygate_core::{BlockConfig, GradeEvent, InMemoryGradeBook, GRADE_EVENT_KIND};
use masterygate_server::{router, AppState, ServerConfig};

const TOPIC: &str = "algebra/multiplication";
const SIG_ALGEBRA: &str = "4b2d31b474ed89ec67c60acbbcbf1d72";

fn app() -> (Router, Arc<InMemoryGradeBook>) {
    let book = Arc::new(InMemoryGradeBook::new());
    let config = BlockConfig::new(TOPIC, "test").unwrap();
    (router(AppState::new(config, book.clone())), book)
}

async fn send(app: &Router, method: Method, uri: &str, body: Body) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn json_body(v: Value) -> Body { Body::from(serde_json::to_vec(&v).unwrap()) }

#[tokio::test]
async fn accepted_report_is_published() {
    let (app, book) = app();
    let body = json!({ "mastery": { TOPIC: 0.7 }, "user_id": "abc", "signature": SIG_ALGEBRA });
    let (status, json) = send(&app, Method::POST, "/handle_grade", json_body(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, Value::Null);

    let events = book.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, GRADE_EVENT_KIND);
    assert_eq!(events[0].event, GradeEvent { value: 0.7, max_value: 0.7 });
}

#[tokio::test]
async fn rejections_look_identical_to_success() {
    let (app, book) = app();
    let bodies = vec![
        json_body(json!({ "mastery": { TOPIC: 0.7 }, "user_id": "abc", "signature": "4b2d31b474ed89ec67c60acbbcbf1d73" })),
        json_body(json!({ "mastery": { "geometry/area": 0.9 }, "user_id": "abc", "signature": "15dae202d9a1087a47743a72f90c07f3" })),
        json_body(json!({ "mastery": {}, "user_id": "abc", "signature": SIG_ALGEBRA })),
        json_body(json!({ "mastery": { TOPIC: "high" }, "user_id": "abc", "signature": SIG_ALGEBRA })),
        Body::from("{not json"),
        Body::empty(),
    ];
    for body in bodies {
        let (status, json) = send(&app, Method::POST, "/handle_grade", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, Value::Null);
    }
    assert!(book.is_empty());
}

#[tokio::test]
async fn oversized_body_is_declined_quietly() {
    let (app, book) = app();
    let mut raw = serde_json::to_vec(&json!({ "mastery": { TOPIC: 0.7 }, "user_id": "abc", "signature": SIG_ALGEBRA })).unwrap();
    raw.resize(3 * 1024 * 1024, b' ');
    let (status, json) = send(&app, Method::POST, "/handle_grade", Body::from(raw)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, Value::Null);
    assert!(book.is_empty());
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = app();
    let (status, json) = send(&app, Method::GET, "/health", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "status": "ok" }));
}

#[test]
fn server_config_defaults_and_validation() {
    let cfg = ServerConfig::from_lookup(|_| None).unwrap();
    assert_eq!(cfg.listen_addr.to_string(), "0.0.0.0:8080");

    let cfg = ServerConfig::from_lookup(|name| match name {
        "HOST" => Some("127.0.0.1".into()),
        "PORT" => Some("9753".into()),
        _ => None,
    })
    .unwrap();
    assert_eq!(cfg.listen_addr.to_string(), "127.0.0.1:9753");

    assert!(ServerConfig::from_lookup(|name| (name == "PORT").then(|| "nope".to_string())).is_err());
}
