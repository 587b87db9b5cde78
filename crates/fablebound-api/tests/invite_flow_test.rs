//! Integration tests for the invite protocol over HTTP.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{build_test_app, get_json, post_json};

async fn create_session(app: &common::TestApp) -> String {
    let (status, session) = post_json(
        app,
        "tok-alice",
        "/api/v1/sessions",
        &json!({ "name": "Elyra" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    session["id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn test_invite_accept_then_join() {
    // Arrange
    let app = build_test_app(&[]);
    let session_id = create_session(&app).await;

    // Act — alice invites bob, bob accepts and joins.
    let (status, invite) = post_json(
        &app,
        "tok-alice",
        "/api/v1/invites",
        &json!({ "session_id": session_id, "recipient_email": "bob@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(invite["sender_name"], "Elyra");
    let invite_id = invite["id"].as_str().unwrap().to_owned();

    let (status, pending) = get_json(&app, "tok-bob", "/api/v1/invites/pending").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, accepted) = post_json(
        &app,
        "tok-bob",
        &format!("/api/v1/invites/{invite_id}/accept"),
        &json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "accepted");

    let (status, joined) = post_json(
        &app,
        "tok-bob",
        &format!("/api/v1/sessions/{session_id}/join"),
        &json!({ "name": "Torben" }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert!(joined["members"]
        .as_array()
        .unwrap()
        .iter()
        .any(|m| m == "bob"));
    let (_, pending) = get_json(&app, "tok-bob", "/api/v1/invites/pending").await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_declined_invite_leaves_membership_untouched() {
    // Arrange
    let app = build_test_app(&[]);
    let session_id = create_session(&app).await;
    let (_, invite) = post_json(
        &app,
        "tok-alice",
        "/api/v1/invites",
        &json!({ "session_id": session_id, "recipient_email": "bob@example.com" }),
    )
    .await;
    let invite_id = invite["id"].as_str().unwrap().to_owned();

    // Act
    let (status, declined) = post_json(
        &app,
        "tok-bob",
        &format!("/api/v1/invites/{invite_id}/decline"),
        &json!({}),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(declined["status"], "declined");
    let (_, listed) = get_json(&app, "tok-bob", "/api/v1/sessions").await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_inviting_an_unknown_email_returns_404() {
    let app = build_test_app(&[]);
    let session_id = create_session(&app).await;

    let (status, body) = post_json(
        &app,
        "tok-alice",
        "/api/v1/invites",
        &json!({ "session_id": session_id, "recipient_email": "nobody@example.com" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_inviting_a_member_returns_409() {
    let app = build_test_app(&[]);
    let session_id = create_session(&app).await;
    post_json(
        &app,
        "tok-bob",
        &format!("/api/v1/sessions/{session_id}/join"),
        &json!({ "name": "Torben" }),
    )
    .await;

    let (status, body) = post_json(
        &app,
        "tok-alice",
        "/api/v1/invites",
        &json!({ "session_id": session_id, "recipient_email": "bob@example.com" }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_exists");
}

#[tokio::test]
async fn test_answering_an_invite_twice_returns_400() {
    let app = build_test_app(&[]);
    let session_id = create_session(&app).await;
    let (_, invite) = post_json(
        &app,
        "tok-alice",
        "/api/v1/invites",
        &json!({ "session_id": session_id, "recipient_email": "bob@example.com" }),
    )
    .await;
    let invite_id = invite["id"].as_str().unwrap().to_owned();
    post_json(
        &app,
        "tok-bob",
        &format!("/api/v1/invites/{invite_id}/accept"),
        &json!({}),
    )
    .await;

    let (status, body) = post_json(
        &app,
        "tok-bob",
        &format!("/api/v1/invites/{invite_id}/decline"),
        &json!({}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_argument");
}
