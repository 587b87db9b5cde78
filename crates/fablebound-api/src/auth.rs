//! Bearer-token authentication for request handlers.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use fablebound_core::error::DomainError;
use fablebound_core::identity::Identity;

use crate::state::AppState;

/// Resolves the caller's identity from the `Authorization: Bearer` header.
///
/// # Errors
///
/// Returns `DomainError::Unauthenticated` when the header is missing,
/// malformed, or the token is unknown.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Identity, DomainError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(DomainError::Unauthenticated)?;
    state.identities.authenticate(token).await
}
