//! Invites — send, list, accept, decline.
//!
//! Accepting an invite does not itself perform the join; it authorizes the
//! recipient to call join for the referenced session. Answered invites are
//! kept as an audit trail.

use tracing::info;
use uuid::Uuid;

use fablebound_core::error::DomainError;
use fablebound_core::identity::{Identity, IdentityProvider};
use fablebound_core::invite::{Invite, InviteStatus, NewInvite};
use fablebound_core::store::ContentStore;

/// Sends an invite for `session_id` to the identity behind
/// `recipient_email`.
///
/// # Errors
///
/// - `InvalidArgument` — blank email, or sender inviting themself.
/// - `NotFound` — unresolvable email, missing session, or the sender has no
///   character in the session.
/// - `AlreadyExists` — the recipient is already a member.
pub async fn send_invite(
    sender: &Identity,
    session_id: Uuid,
    recipient_email: &str,
    store: &dyn ContentStore,
    identities: &dyn IdentityProvider,
) -> Result<Invite, DomainError> {
    let recipient_email = recipient_email.trim();
    if recipient_email.is_empty() {
        return Err(DomainError::InvalidArgument(
            "recipient email must not be empty".to_owned(),
        ));
    }
    let recipient = identities.lookup_by_email(recipient_email).await?;
    if recipient.participant_id == sender.participant_id {
        return Err(DomainError::InvalidArgument(
            "cannot invite yourself".to_owned(),
        ));
    }
    let session = store
        .get_session(session_id)
        .await?
        .ok_or_else(|| DomainError::not_found("session", session_id))?;
    if session.is_member(&recipient.participant_id) {
        return Err(DomainError::AlreadyExists(format!(
            "{} is already a member of the session",
            recipient.participant_id
        )));
    }
    let sender_character = store
        .get_character(session_id, &sender.participant_id)
        .await?
        .ok_or_else(|| DomainError::not_found("character", &sender.participant_id))?;

    let invite = store
        .create_invite(NewInvite {
            session_id,
            sender: sender.participant_id.clone(),
            sender_name: sender_character.name,
            recipient: recipient.participant_id,
            recipient_email: recipient.email,
        })
        .await?;
    info!(invite_id = %invite.id, session_id = %session_id, "invite sent");
    Ok(invite)
}

/// Pending invites addressed to the caller, oldest first.
///
/// # Errors
///
/// Returns `DomainError::Internal` on store failure.
pub async fn pending_invites(
    identity: &Identity,
    store: &dyn ContentStore,
) -> Result<Vec<Invite>, DomainError> {
    store.pending_invites_for(&identity.participant_id).await
}

/// Accepts a pending invite addressed to the caller.
///
/// # Errors
///
/// See [`respond`].
pub async fn accept_invite(
    invite_id: Uuid,
    identity: &Identity,
    store: &dyn ContentStore,
) -> Result<Invite, DomainError> {
    respond(invite_id, identity, store, InviteStatus::Accepted).await
}

/// Declines a pending invite addressed to the caller.
///
/// # Errors
///
/// See [`respond`].
pub async fn decline_invite(
    invite_id: Uuid,
    identity: &Identity,
    store: &dyn ContentStore,
) -> Result<Invite, DomainError> {
    respond(invite_id, identity, store, InviteStatus::Declined).await
}

/// Shared accept/decline transition.
///
/// # Errors
///
/// - `NotFound` — no such invite.
/// - `PermissionDenied` — the invite is addressed to someone else.
/// - `InvalidArgument` — the invite was already answered.
async fn respond(
    invite_id: Uuid,
    identity: &Identity,
    store: &dyn ContentStore,
    status: InviteStatus,
) -> Result<Invite, DomainError> {
    let invite = store
        .get_invite(invite_id)
        .await?
        .ok_or_else(|| DomainError::not_found("invite", invite_id))?;
    if invite.recipient != identity.participant_id {
        return Err(DomainError::PermissionDenied(
            "invite is addressed to another participant".to_owned(),
        ));
    }
    if invite.status != InviteStatus::Pending {
        return Err(DomainError::InvalidArgument(
            "invite has already been answered".to_owned(),
        ));
    }
    store.set_invite_status(invite_id, status).await?;
    info!(invite_id = %invite_id, status = status.as_str(), "invite answered");
    Ok(Invite { status, ..invite })
}
