//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use fablebound_api::routes;
use fablebound_api::state::AppState;
use fablebound_api::worker;
use fablebound_content::SceneLibrary;
use fablebound_core::narration::NarrationProvider;
use fablebound_test_support::{FixedClock, MemoryStore, ScriptedNarrator, StaticIdentities};

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 3, 1, 12, 0, 0).unwrap(),
    ))
}

/// A full in-memory application: router, store, and a live narration
/// worker, wired the same way as `main.rs`.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

/// Builds the app with narration lines the scripted provider will return
/// in order.
pub fn build_test_app(narration: &[&str]) -> TestApp {
    build_test_app_with_provider(Arc::new(ScriptedNarrator::new(narration)))
}

/// Builds the app around a custom narration provider, for failure-path
/// tests.
pub fn build_test_app_with_provider(provider: Arc<dyn NarrationProvider>) -> TestApp {
    let store = Arc::new(MemoryStore::new(fixed_clock()));
    let scenes = Arc::new(SceneLibrary::builtin());
    let identities = Arc::new(
        StaticIdentities::new()
            .with("tok-alice", "alice", "Alice", "alice@example.com")
            .with("tok-bob", "bob", "Bob", "bob@example.com")
            .with("tok-carol", "carol", "Carol", "carol@example.com"),
    );
    let (narration_tx, _handle) = worker::spawn(store.clone(), provider, scenes.clone());
    let app_state = AppState::new(store.clone(), identities, scenes, narration_tx);

    let router = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/sessions", routes::session::router())
        .nest("/api/v1/invites", routes::invite::router())
        .with_state(app_state);

    TestApp { router, store }
}

/// Send a POST request with a bearer token and JSON body.
pub async fn post_json(
    app: &TestApp,
    token: &str,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request with a bearer token.
pub async fn get_json(app: &TestApp, token: &str, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a DELETE request with a bearer token.
pub async fn delete(app: &TestApp, token: &str, uri: &str) -> StatusCode {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    response.status()
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Polls the message log until `predicate` matches a message or the
/// attempts run out. The narration worker is asynchronous, so tests that
/// post an action wait for its outcome here.
pub async fn wait_for_message(
    app: &TestApp,
    token: &str,
    session_id: &str,
    predicate: impl Fn(&serde_json::Value) -> bool,
) -> Option<serde_json::Value> {
    for _ in 0..100 {
        let (status, messages) =
            get_json(app, token, &format!("/api/v1/sessions/{session_id}/messages")).await;
        assert_eq!(status, StatusCode::OK);
        if let Some(found) = messages
            .as_array()
            .unwrap()
            .iter()
            .find(|message| predicate(message))
        {
            return Some(found.clone());
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    None
}
