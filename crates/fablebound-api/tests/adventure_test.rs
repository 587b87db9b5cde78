//! End-to-end narration tests: opening prompt, a narrated action, and the
//! recovery path when the provider fails.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use fablebound_test_support::FailingNarrator;

use common::{build_test_app, build_test_app_with_provider, get_json, post_json, wait_for_message};

#[tokio::test]
async fn test_begin_narrates_and_removes_the_opening_prompt() {
    // Arrange
    let app = build_test_app(&["Mist hangs over the hollow crown of the old keep."]);
    let (_, session) = post_json(
        &app,
        "tok-alice",
        "/api/v1/sessions",
        &json!({ "name": "Elyra" }),
    )
    .await;
    let session_id = session["id"].as_str().unwrap().to_owned();

    // Act
    let (status, prompt) = post_json(
        &app,
        "tok-alice",
        &format!("/api/v1/sessions/{session_id}/begin"),
        &json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prompt["is_adventure_start"], true);

    // Assert — the opening narration lands...
    let narrated = wait_for_message(&app, "tok-alice", &session_id, |m| {
        m["author_role"] == "narrator" && m["is_turn_announcement"] == false
    })
    .await
    .expect("opening narration never arrived");
    assert_eq!(
        narrated["body"],
        "Mist hangs over the hollow crown of the old keep."
    );

    // ...and the prompt sentinel is gone from the log.
    let (_, messages) = get_json(
        &app,
        "tok-alice",
        &format!("/api/v1/sessions/{session_id}/messages"),
    )
    .await;
    assert!(!messages
        .as_array()
        .unwrap()
        .iter()
        .any(|m| m["is_adventure_start"] == true));
}

#[tokio::test]
async fn test_action_is_narrated_and_turn_rotates_back_in_solo_play() {
    // Arrange
    let app = build_test_app(&["The door gives way with a groan."]);
    let (_, session) = post_json(
        &app,
        "tok-alice",
        "/api/v1/sessions",
        &json!({ "name": "Elyra" }),
    )
    .await;
    let session_id = session["id"].as_str().unwrap().to_owned();

    // Act
    let (status, _) = post_json(
        &app,
        "tok-alice",
        &format!("/api/v1/sessions/{session_id}/messages"),
        &json!({ "body": "I force the door." }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Assert — narration plus the announcement that it is Elyra's turn again.
    let narrated = wait_for_message(&app, "tok-alice", &session_id, |m| {
        m["author_role"] == "narrator" && m["is_turn_announcement"] == false
    })
    .await
    .expect("narration never arrived");
    assert_eq!(narrated["body"], "The door gives way with a groan.");

    let announcement = wait_for_message(&app, "tok-alice", &session_id, |m| {
        m["is_turn_announcement"] == true
    })
    .await
    .expect("turn announcement never arrived");
    assert_eq!(announcement["body"], "It is now Elyra's turn.");

    // Posting again succeeds, proving the turn came back to alice.
    let (status, _) = post_json(
        &app,
        "tok-alice",
        &format!("/api/v1/sessions/{session_id}/messages"),
        &json!({ "body": "I step through." }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_failed_narration_recovers_the_turn() {
    // Arrange — the provider is down.
    let app = build_test_app_with_provider(Arc::new(FailingNarrator));
    let (_, session) = post_json(
        &app,
        "tok-alice",
        "/api/v1/sessions",
        &json!({ "name": "Elyra" }),
    )
    .await;
    let session_id = session["id"].as_str().unwrap().to_owned();

    // Act
    post_json(
        &app,
        "tok-alice",
        &format!("/api/v1/sessions/{session_id}/messages"),
        &json!({ "body": "I force the door." }),
    )
    .await;

    // Assert — an in-universe recovery message appears and alice can act
    // again immediately.
    let recovery = wait_for_message(&app, "tok-alice", &session_id, |m| {
        m["author_role"] == "narrator"
    })
    .await
    .expect("recovery message never arrived");
    assert!(recovery["body"]
        .as_str()
        .unwrap()
        .contains("attempt your action once more"));

    let (status, _) = post_json(
        &app,
        "tok-alice",
        &format!("/api/v1/sessions/{session_id}/messages"),
        &json!({ "body": "I try again." }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
