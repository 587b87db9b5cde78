//! File-backed identity provider.
//!
//! Identities are loaded once at startup from a JSON file mapping opaque
//! bearer tokens to identity records. This stands in for a full identity
//! service while keeping the trait seam honest.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use fablebound_core::error::DomainError;
use fablebound_core::identity::{Identity, IdentityProvider};
use fablebound_core::participant::ParticipantId;

#[derive(Debug, Deserialize)]
struct IdentityRecord {
    participant_id: String,
    display_name: String,
    email: String,
}

/// Identity provider backed by a static token map.
#[derive(Debug)]
pub struct FileIdentityProvider {
    by_token: HashMap<String, Identity>,
}

impl FileIdentityProvider {
    /// Loads the token map from `path`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` when the file is missing or not
    /// valid JSON.
    pub fn load(path: &Path) -> Result<Self, DomainError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|error| DomainError::Internal(format!("identity file: {error}")))?;
        let records: HashMap<String, IdentityRecord> = serde_json::from_str(&raw)
            .map_err(|error| DomainError::Internal(format!("identity file: {error}")))?;

        let by_token = records
            .into_iter()
            .map(|(token, record)| {
                (
                    token,
                    Identity {
                        participant_id: ParticipantId::new(record.participant_id),
                        display_name: record.display_name,
                        email: record.email,
                    },
                )
            })
            .collect();
        Ok(Self { by_token })
    }
}

#[async_trait]
impl IdentityProvider for FileIdentityProvider {
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
