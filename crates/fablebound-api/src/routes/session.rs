//! Routes for sessions, membership, and the message log.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Json, Router, routing::delete, routing::get, routing::post};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use fablebound_core::character::NewCharacter;
use fablebound_core::error::DomainError;
use fablebound_core::message::{ADVENTURE_START_PROMPT, Message, NewMessage};
use fablebound_core::session::Session;
use fablebound_membership::sessions;
use fablebound_narration::orchestrator::MessageCreated;
use fablebound_narration::turn::pass_turn;

use crate::auth::authenticate;
use crate::error::ApiError;
use crate::state::AppState;

/// Default page size for GET /{id}/messages.
const DEFAULT_MESSAGE_LIMIT: u32 = 50;

/// Request body for POST /{id}/messages.
#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    /// The in-character action text.
    pub body: String,
}

/// Query parameters for GET /{id}/messages.
#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    /// Maximum number of messages to return, newest first.
    pub limit: Option<u32>,
}

/// POST /
#[instrument(skip_all)]
async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(character): Json<NewCharacter>,
) -> Result<Json<Session>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let session = sessions::create_and_join_session(&identity, character, &*state.store).await?;
    info!(session_id = %session.id, "session created");
    Ok(Json(session))
}

/// GET /
#[instrument(skip_all)]
async fn list_sessions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Session>>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let listed = sessions::list_sessions(&identity, &*state.store).await?;
    Ok(Json(listed))
}

/// POST /{id}/join
#[instrument(skip_all, fields(session_id = %session_id))]
async fn join_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<Uuid>,
    Json(character): Json<NewCharacter>,
) -> Result<Json<Session>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let session =
        sessions::join_session(session_id, &identity, character, &*state.store).await?;
    info!(session_id = %session.id, participant = %identity.participant_id, "participant joined");
    Ok(Json(session))
}

/// POST /{id}/pass-turn
#[instrument(skip_all, fields(session_id = %session_id))]
async fn pass_session_turn(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Session>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let session = pass_turn(session_id, &identity.participant_id, &*state.store).await?;
    Ok(Json(session))
}

/// DELETE /{id}
#[instrument(skip_all, fields(session_id = %session_id))]
async fn delete_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    sessions::delete_character_and_session(session_id, &identity, &*state.store).await?;
    info!(session_id = %session_id, "session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Loads the session and rejects callers who are not members.
async fn member_session(
    state: &AppState,
    session_id: Uuid,
    caller: &fablebound_core::identity::Identity,
) -> Result<Session, DomainError> {
    let session = state
        .store
        .get_session(session_id)
        .await?
        .ok_or_else(|| DomainError::not_found("session", session_id))?;
    if !session.is_member(&caller.participant_id) {
        return Err(DomainError::PermissionDenied(
            "caller is not a member of the session".to_owned(),
        ));
    }
    Ok(session)
}

/// Appends the message and queues it for narration.
async fn append_and_queue(
    state: &AppState,
    message: NewMessage,
) -> Result<Message, DomainError> {
    let message = state.store.append_message(message).await?;
    state
        .narration_tx
        .send(MessageCreated {
            message: message.clone(),
        })
        .await
        .map_err(|_| DomainError::Internal("narration queue is closed".to_owned()))?;
    Ok(message)
}

/// POST /{id}/messages
#[instrument(skip_all, fields(session_id = %session_id))]
async fn post_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<Uuid>,
    Json(request): Json<PostMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let body = request.body.trim();
    if body.is_empty() {
        return Err(DomainError::InvalidArgument("message body must not be empty".to_owned()).into());
    }
    let session = member_session(&state, session_id, &identity).await?;
    if session.current_turn != identity.participant_id {
        return Err(DomainError::PermissionDenied("it is not your turn".to_owned()).into());
    }
    let character = state
        .store
        .get_character(session_id, &identity.participant_id)
        .await?
        .ok_or_else(|| DomainError::not_found("character", &identity.participant_id))?;

    let message = append_and_queue(
        &state,
        NewMessage::participant(
            session_id,
            identity.participant_id.clone(),
            character.name,
            body.to_owned(),
            false,
        ),
    )
    .await?;
    info!(message_id = %message.id, "action posted");
    Ok(Json(message))
}

/// POST /{id}/begin
///
/// Posts the opening prompt on behalf of the owner. The prompt message is
/// removed from the log once the opening narration lands.
#[instrument(skip_all, fields(session_id = %session_id))]
async fn begin_adventure(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Message>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let session = member_session(&state, session_id, &identity).await?;
    if session.owner != identity.participant_id {
        return Err(
            DomainError::PermissionDenied("only the owner can begin the adventure".to_owned())
                .into(),
        );
    }
    if session.current_turn != identity.participant_id {
        return Err(DomainError::PermissionDenied("it is not your turn".to_owned()).into());
    }
    let character = state
        .store
        .get_character(session_id, &identity.participant_id)
        .await?
        .ok_or_else(|| DomainError::not_found("character", &identity.participant_id))?;

    let message = append_and_queue(
        &state,
        NewMessage::participant(
            session_id,
            identity.participant_id.clone(),
            character.name,
            ADVENTURE_START_PROMPT.to_owned(),
            true,
        ),
    )
    .await?;
    info!(message_id = %message.id, "adventure started");
    Ok(Json(message))
}

/// GET /{id}/messages
#[instrument(skip_all, fields(session_id = %session_id))]
async fn get_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<Uuid>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    member_session(&state, session_id, &identity).await?;
    let limit = query.limit.unwrap_or(DEFAULT_MESSAGE_LIMIT);
    let messages = state.store.recent_messages(session_id, limit).await?;
    Ok(Json(messages))
}

/// Returns the router for sessions and messages.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session).get(list_sessions))
        .route("/{id}/join", post(join_session))
        .route("/{id}/pass-turn", post(pass_session_turn))
        .route("/{id}", delete(delete_session))
        .route("/{id}/begin", post(begin_adventure))
        .route("/{id}/messages", post(post_message).get(get_messages))
}
