//! Test identity provider — a fixed token/email table.

use std::collections::HashMap;

use async_trait::async_trait;
use fablebound_core::error::DomainError;
use fablebound_core::identity::{Identity, IdentityProvider};
use fablebound_core::participant::ParticipantId;

/// An identity provider backed by a fixed in-memory table. Tokens are the
/// lookup key for authentication; emails for invitations.
#[derive(Debug, Default)]
pub struct StaticIdentities {
    by_token: HashMap<String, Identity>,
}

impl StaticIdentities {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an identity under `token`. The token doubles as nothing
    /// else; participant id, name, and email are the identity's own.
    #[must_use]
    pub fn with(mut self, token: &str, participant_id: &str, name: &str, email: &str) -> Self {
        self.by_token.insert(
            token.to_owned(),
            Identity {
                participant_id: ParticipantId::new(participant_id),
                display_name: name.to_owned(),
                email: email.to_owned(),
            },
        );
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentities {
    async fn authenticate(&self, token: &str) -> Result<Identity, DomainError> {
        self.by_token
            .get(token)
            .cloned()
            .ok_or(DomainError::Unauthenticated)
    }

    async fn lookup_by_email(&self, email: &str) -> Result<Identity, DomainError> {
        self.by_token
            .values()
            .find(|identity| identity.email == email)
            .cloned()
            .ok_or_else(|| DomainError::not_found("identity", email))
    }
}
