//! Routes for the invite protocol.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::{Json, Router, routing::get, routing::post};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use fablebound_core::invite::Invite;
use fablebound_membership::invites;

use crate::auth::authenticate;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct SendInviteRequest {
    /// The session the recipient is invited to.
    pub session_id: Uuid,
    /// Email the recipient's identity is registered under.
    pub recipient_email: String,
}

/// POST /
#[instrument(skip_all, fields(session_id = %request.session_id))]
async fn send_invite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SendInviteRequest>,
) -> Result<Json<Invite>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let invite = invites::send_invite(
        &identity,
        request.session_id,
        &request.recipient_email,
        &*state.store,
        &*state.identities,
    )
    .await?;
    info!(invite_id = %invite.id, "invite sent");
    Ok(Json(invite))
}

/// GET /pending
#[instrument(skip_all)]
async fn pending_invites(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Invite>>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let pending = invites::pending_invites(&identity, &*state.store).await?;
    Ok(Json(pending))
}

/// POST /{id}/accept
#[instrument(skip_all, fields(invite_id = %invite_id))]
async fn accept_invite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(invite_id): Path<Uuid>,
) -> Result<Json<Invite>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let invite = invites::accept_invite(invite_id, &identity, &*state.store).await?;
    Ok(Json(invite))
}

/// POST /{id}/decline
#[instrument(skip_all, fields(invite_id = %invite_id))]
async fn decline_invite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(invite_id): Path<Uuid>,
) -> Result<Json<Invite>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let invite = invites::decline_invite(invite_id, &identity, &*state.store).await?;
    Ok(Json(invite))
}

/// Returns the router for invites.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(send_invite))
        .route("/pending", get(pending_invites))
        .route("/{id}/accept", post(accept_invite))
        .route("/{id}/decline", post(decline_invite))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use fablebound_content::SceneLibrary;
    use fablebound_core::character::{AttributeSet, NewCharacter};
    use fablebound_core::identity::Identity;
    use fablebound_core::participant::ParticipantId;
    use fablebound_core::session::Session;
    use fablebound_membership::sessions::create_and_join_session;
    use fablebound_test_support::{FixedClock, MemoryStore, StaticIdentities};
    use serde_json::Value;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use fablebound_narration::orchestrator::MessageCreated;

    fn state_with(store: Arc<MemoryStore>) -> (AppState, mpsc::Receiver<MessageCreated>) {
        let (tx, rx) = mpsc::channel(8);
        let identities = Arc::new(
            StaticIdentities::new()
                .with("tok-alice", "alice", "Alice", "alice@example.com")
                .with("tok-bob", "bob", "Bob", "bob@example.com"),
        );
        let state = AppState::new(store, identities, Arc::new(SceneLibrary::builtin()), tx);
        (state, rx)
    }

    fn memory_store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        ))))
    }

    async fn session_owned_by_alice(store: &MemoryStore) -> Session {
        create_and_join_session(
            &Identity {
                participant_id: ParticipantId::new("alice"),
                display_name: "Alice".to_owned(),
                email: "alice@example.com".to_owned(),
            },
            NewCharacter {
                name: "Elyra".to_owned(),
                attributes: AttributeSet::default(),
            },
            store,
        )
        .await
        .unwrap()
    }

    fn post_request(uri: &str, token: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_send_and_accept_invite() {
        // Arrange
        let store = memory_store();
        let session = session_owned_by_alice(&store).await;
        let (state, _rx) = state_with(store);
        let app = router().with_state(state);
        let body = serde_json::json!({
            "session_id": session.id,
            "recipient_email": "bob@example.com",
        });

        // Act — send as alice, accept as bob.
        let response = app
            .clone()
            .oneshot(post_request("/", "tok-alice", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let sent = body_json(response).await;
        assert_eq!(sent["status"], "pending");
        let invite_id = sent["id"].as_str().unwrap();

        let response = app
            .oneshot(post_request(
                &format!("/{invite_id}/accept"),
                "tok-bob",
                &serde_json::json!({}),
            ))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let accepted = body_json(response).await;
        assert_eq!(accepted["status"], "accepted");
    }

    #[tokio::test]
    async fn test_pending_lists_only_the_callers_invites() {
        // Arrange
        let store = memory_store();
        let session = session_owned_by_alice(&store).await;
        let (state, _rx) = state_with(store);
        let app = router().with_state(state);
        let body = serde_json::json!({
            "session_id": session.id,
            "recipient_email": "bob@example.com",
        });
        app.clone()
            .oneshot(post_request("/", "tok-alice", &body))
            .await
            .unwrap();

        // Act
        let bob_request = Request::builder()
            .method("GET")
            .uri("/pending")
            .header("authorization", "Bearer tok-bob")
            .body(Body::empty())
            .unwrap();
        let bob_response = app.clone().oneshot(bob_request).await.unwrap();
        let alice_request = Request::builder()
            .method("GET")
            .uri("/pending")
            .header("authorization", "Bearer tok-alice")
            .body(Body::empty())
            .unwrap();
        let alice_response = app.oneshot(alice_request).await.unwrap();

        // Assert
        let bob_pending = body_json(bob_response).await;
        assert_eq!(bob_pending.as_array().unwrap().len(), 1);
        let alice_pending = body_json(alice_response).await;
        assert!(alice_pending.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accepting_someone_elses_invite_returns_403() {
        // Arrange
        let store = memory_store();
        let session = session_owned_by_alice(&store).await;
        let (state, _rx) = state_with(store);
        let app = router().with_state(state);
        let body = serde_json::json!({
            "session_id": session.id,
            "recipient_email": "bob@example.com",
        });
        let sent = body_json(
            app.clone()
                .oneshot(post_request("/", "tok-alice", &body))
                .await
                .unwrap(),
        )
        .await;
        let invite_id = sent["id"].as_str().unwrap();

        // Act — alice tries to accept bob's invite.
        let response = app
            .oneshot(post_request(
                &format!("/{invite_id}/accept"),
                "tok-alice",
                &serde_json::json!({}),
            ))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_self_invite_returns_400() {
        let store = memory_store();
        let session = session_owned_by_alice(&store).await;
        let (state, _rx) = state_with(store);
        let app = router().with_state(state);
        let body = serde_json::json!({
            "session_id": session.id,
            "recipient_email": "alice@example.com",
        });

        let response = app
            .oneshot(post_request("/", "tok-alice", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "invalid_argument");
    }
}
