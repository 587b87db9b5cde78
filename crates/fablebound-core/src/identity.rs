//! Identity provider abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::participant::ParticipantId;

/// An authenticated participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable participant identifier.
    pub participant_id: ParticipantId,
    /// Display name registered with the identity provider.
    pub display_name: String,
    /// Email address registered with the identity provider.
    pub email: String,
}

/// Resolves credentials and email addresses to participant identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a bearer credential to an identity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Unauthenticated` when the credential does not
    /// resolve.
    async fn authenticate(&self, token: &str) -> Result<Identity, DomainError>;

    /// Resolves an email address to an identity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` when no identity carries the address.
    async fn lookup_by_email(&self, email: &str) -> Result<Identity, DomainError>;
}
