//! Tests for the client id intake endpoint.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ga_events::{intake, Config, MemorySession, Session, SessionHandle};
use std::sync::Arc;
use tower::ServiceExt;

const KEY: &str = "google-analytics-client-id";

fn config() -> Config {
    Config::builder("UA-1234-5").build().unwrap()
}

fn post(uri: &str, body: &str, session: Arc<MemorySession>) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap();
    req.extensions_mut().insert(SessionHandle::new(session));
    req
}

#[tokio::test]
async fn test_stores_client_id() {
    let app = intake::router(&config());
    let session = Arc::new(MemorySession::new());

    let response = app
        .oneshot(post("/gaid", r#"{"clientId":"555.1234"}"#, session.clone()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(session.get(KEY).as_deref(), Some("555.1234"));
}

#[tokio::test]
async fn test_repeated_post_is_idempotent() {
    let app = intake::router(&config());
    let session = Arc::new(MemorySession::new());

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post("/gaid", r#"{"clientId":"555.1234"}"#, session.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(session.get(KEY).as_deref(), Some("555.1234"));
        assert_eq!(session.len(), 1);
    }
}

#[tokio::test]
async fn test_new_client_id_replaces_old() {
    let app = intake::router(&config());
    let session = Arc::new(MemorySession::new());
    session.put(KEY, "old".into());

    let response = app
        .oneshot(post("/gaid", r#"{"clientId":"new"}"#, session.clone()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(session.get(KEY).as_deref(), Some("new"));
}

#[tokio::test]
async fn test_empty_or_missing_client_id_rejected() {
    let app = intake::router(&config());
    let session = Arc::new(MemorySession::new());
    session.put(KEY, "kept".into());

    for body in [r#"{"clientId":""}"#, r#"{"clientId":"   "}"#, r#"{}"#] {
        let response = app
            .clone()
            .oneshot(post("/gaid", body, session.clone()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(session.get(KEY).as_deref(), Some("kept"));
    }
}

#[tokio::test]
async fn test_malformed_body_is_client_error() {
    let app = intake::router(&config());
    let session = Arc::new(MemorySession::new());

    let response = app
        .oneshot(post("/gaid", "clientId=555", session.clone()))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert!(session.is_empty());
}

#[tokio::test]
async fn test_custom_path_and_session_key() {
    let config = Config::builder("UA-1234-5")
        .http_uri("/analytics/client")
        .client_id_session_key("ga_cid")
        .build()
        .unwrap();
    let app = intake::router(&config);
    let session = Arc::new(MemorySession::new());

    let response = app
        .clone()
        .oneshot(post("/gaid", r#"{"clientId":"x"}"#, session.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(post("/analytics/client", r#"{"clientId":"x"}"#, session.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(session.get("ga_cid").as_deref(), Some("x"));
}

#[tokio::test]
async fn test_missing_session_is_reported() {
    let app = intake::router(&config());
    let req = Request::builder()
        .method("POST")
        .uri("/gaid")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"clientId":"555.1234"}"#))
        .unwrap();

    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "no session attached to the request");
}
