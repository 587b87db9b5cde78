//! PostgreSQL implementation of the `ContentStore` trait.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use fablebound_core::character::{AttributeSet, Character};
use fablebound_core::error::DomainError;
use fablebound_core::invite::{Invite, InviteStatus, NewInvite};
use fablebound_core::message::{AuthorRole, Message, NewMessage};
use fablebound_core::participant::ParticipantId;
use fablebound_core::session::Session;
use fablebound_core::store::ContentStore;

/// PostgreSQL-backed content store. Timestamps are server-assigned
/// (`NOW()`); session writes are conditional on the stored version.
#[derive(Debug, Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    /// Creates a new `PgContentStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the schema if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Internal` on database failure.
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        for statement in crate::schema::ALL_TABLES {
            sqlx::raw_sql(statement)
                .execute(&self.pool)
                .await
                .map_err(internal)?;
        }
        tracing::info!("content store schema ensured");
        Ok(())
    }
}

fn internal(error: impl std::fmt::Display) -> DomainError {
    DomainError::Internal(error.to_string())
}

fn session_from_row(row: &PgRow) -> Result<Session, DomainError> {
    Ok(Session {
        id: row.try_get("id").map_err(internal)?,
        owner: ParticipantId::new(row.try_get::<String, _>("owner").map_err(internal)?),
        turn_order: row
            .try_get::<Json<Vec<ParticipantId>>, _>("turn_order")
            .map_err(internal)?
            .0,
        current_turn: ParticipantId::new(
            row.try_get::<String, _>("current_turn").map_err(internal)?,
        ),
        act: u32::try_from(row.try_get::<i64, _>("act").map_err(internal)?)
            .map_err(internal)?,
        members: row
            .try_get::<Json<BTreeSet<ParticipantId>>, _>("members")
            .map_err(internal)?
            .0,
        version: row.try_get("version").map_err(internal)?,
    })
}

fn message_from_row(row: &PgRow) -> Result<Message, DomainError> {
    let role: String = row.try_get("author_role").map_err(internal)?;
    let author_role = match role.as_str() {
        "participant" => AuthorRole::Participant,
        "narrator" => AuthorRole::Narrator,
        other => return Err(internal(format!("unknown author role {other:?}"))),
    };
    Ok(Message {
        id: row.try_get("id").map_err(internal)?,
        session_id: row.try_get("session_id").map_err(internal)?,
        author: ParticipantId::new(row.try_get::<String, _>("author").map_err(internal)?),
        author_name: row.try_get("author_name").map_err(internal)?,
        author_role,
        body: row.try_get("body").map_err(internal)?,
        is_turn_announcement: row.try_get("is_turn_announcement").map_err(internal)?,
        is_adventure_start: row.try_get("is_adventure_start").map_err(internal)?,
        created_at: row.try_get("created_at").map_err(internal)?,
    })
}

fn invite_from_row(row: &PgRow) -> Result<Invite, DomainError> {
    let status: String = row.try_get("status").map_err(internal)?;
    let status = match status.as_str() {
        "pending" => InviteStatus::Pending,
        "accepted" => InviteStatus::Accepted,
        "declined" => InviteStatus::Declined,
        other => return Err(internal(format!("unknown invite status {other:?}"))),
    };
    Ok(Invite {
        id: row.try_get("id").map_err(internal)?,
        session_id: row.try_get("session_id").map_err(internal)?,
        sender: ParticipantId::new(row.try_get::<String, _>("sender").map_err(internal)?),
        sender_name: row.try_get("sender_name").map_err(internal)?,
        recipient: ParticipantId::new(
            row.try_get::<String, _>("recipient").map_err(internal)?,
        ),
        recipient_email: row.try_get("recipient_email").map_err(internal)?,
        status,
        created_at: row.try_get("created_at").map_err(internal)?,
    })
}

/// Conditional session rewrite inside `tx`; maps a missed write to
/// `NotFound` or `ConcurrencyConflict`.
async fn checked_write(
    tx: &mut Transaction<'_, Postgres>,
    session: &Session,
) -> Result<(), DomainError> {
    let updated = sqlx::query(
        "UPDATE sessions
         SET owner = $2, turn_order = $3, current_turn = $4, act = $5,
             members = $6, version = $7
         WHERE id = $1 AND version = $8",
    )
    .bind(session.id)
    .bind(session.owner.as_str())
    .bind(Json(&session.turn_order))
    .bind(session.current_turn.as_str())
    .bind(i64::from(session.act))
    .bind(Json(&session.members))
    .bind(session.version + 1)
    .bind(session.version)
    .execute(&mut **tx)
    .await
    .map_err(internal)?;

    if updated.rows_affected() == 0 {
        let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM sessions WHERE id = $1")
            .bind(session.id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(internal)?;
        return match actual {
            None => Err(DomainError::not_found("session", session.id)),
            Some(actual) => Err(DomainError::ConcurrencyConflict {
                session_id: session.id,
                expected: session.version,
                actual,
            }),
        };
    }
    Ok(())
}

/// Inserts a character record and, for real characters, its global index
/// entry, inside `tx`.
async fn insert_character(
    tx: &mut Transaction<'_, Postgres>,
    character: &Character,
) -> Result<(), DomainError> {
    sqlx::query(
        "INSERT INTO characters (session_id, owner, name, attributes, is_narrator)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(character.session_id)
    .bind(character.owner.as_str())
    .bind(&character.name)
    .bind(Json(&character.attributes))
    .bind(character.is_narrator)
    .execute(&mut **tx)
    .await
    .map_err(internal)?;

    if !character.is_narrator {
        sqlx::query(
            "INSERT INTO character_index (participant_id, session_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(character.owner.as_str())
        .bind(character.session_id)
        .execute(&mut **tx)
        .await
        .map_err(internal)?;
    }
    Ok(())
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn create_session(
        &self,
        session: &Session,
        characters: &[Character],
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        let result = sqlx::query(
            "INSERT INTO sessions (id, owner, turn_order, current_turn, act, members, version)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(session.id)
        .bind(session.owner.as_str())
        .bind(Json(&session.turn_order))
        .bind(session.current_turn.as_str())
        .bind(i64::from(session.act))
        .bind(Json(&session.members))
        .bind(session.version)
        .execute(&mut *tx)
        .await;

        if let Err(error) = result {
            if let sqlx::Error::Database(db) = &error {
                if db.is_unique_violation() {
                    return Err(DomainError::AlreadyExists(format!(
                        "session {}",
                        session.id
                    )));
                }
            }
            return Err(internal(error));
        }

        for character in characters {
            insert_character(&mut tx, character).await?;
        }
        tx.commit().await.map_err(internal)
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, DomainError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(session_from_row).transpose()
    }

    async fn update_session(&self, session: &Session) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(internal)?;
        checked_write(&mut tx, session).await?;
        tx.commit().await.map_err(internal)
    }

    async fn admit_participant(
        &self,
        session: &Session,
        character: &Character,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(internal)?;
        checked_write(&mut tx, session).await?;
        insert_character(&mut tx, character).await?;
        tx.commit().await.map_err(internal)
    }

    async fn delete_session(&self, id: Uuid) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(internal)?;
        sqlx::query("DELETE FROM character_index WHERE session_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(internal)?;
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(internal)?;
        tx.commit().await.map_err(internal)
    }

    async fn sessions_for(
        &self,
        participant: &ParticipantId,
    ) -> Result<Vec<Session>, DomainError> {
        let rows = sqlx::query(
            "SELECT s.* FROM sessions s
             JOIN character_index ci ON ci.session_id = s.id
             WHERE ci.participant_id = $1
             ORDER BY s.id",
        )
        .bind(participant.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(session_from_row).collect()
    }

    async fn get_character(
        &self,
        session_id: Uuid,
        owner: &ParticipantId,
    ) -> Result<Option<Character>, DomainError> {
        let row = sqlx::query(
            "SELECT session_id, owner, name, attributes, is_narrator
             FROM characters WHERE session_id = $1 AND owner = $2",
        )
        .bind(session_id)
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;

        row.map(|row| {
            Ok(Character {
                session_id: row.try_get("session_id").map_err(internal)?,
                owner: ParticipantId::new(
                    row.try_get::<String, _>("owner").map_err(internal)?,
                ),
                name: row.try_get("name").map_err(internal)?,
                attributes: row
                    .try_get::<Json<AttributeSet>, _>("attributes")
                    .map_err(internal)?
                    .0,
                is_narrator: row.try_get("is_narrator").map_err(internal)?,
            })
        })
        .transpose()
    }

    async fn delete_characters_batch(
        &self,
        session_id: Uuid,
        limit: u32,
    ) -> Result<u64, DomainError> {
        let deleted = sqlx::query(
            "DELETE FROM characters
             WHERE (session_id, owner) IN (
                 SELECT session_id, owner FROM characters
                 WHERE session_id = $1 ORDER BY owner LIMIT $2
             )",
        )
        .bind(session_id)
        .bind(i64::from(limit))
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        Ok(deleted.rows_affected())
    }

    async fn append_message(&self, message: NewMessage) -> Result<Message, DomainError> {
        let id = Uuid::new_v4();
        let row = sqlx::query(
            "INSERT INTO messages
                 (id, session_id, author, author_name, author_role, body,
                  is_turn_announcement, is_adventure_start)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING created_at",
        )
        .bind(id)
        .bind(message.session_id)
        .bind(message.author.as_str())
        .bind(&message.author_name)
        .bind(message.author_role.as_str())
        .bind(&message.body)
        .bind(message.is_turn_announcement)
        .bind(message.is_adventure_start)
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;

        Ok(Message {
            id,
            session_id: message.session_id,
            author: message.author,
            author_name: message.author_name,
            author_role: message.author_role,
            body: message.body,
            is_turn_announcement: message.is_turn_announcement,
            is_adventure_start: message.is_adventure_start,
            created_at: row.try_get("created_at").map_err(internal)?,
        })
    }

    async fn recent_messages(
        &self,
        session_id: Uuid,
        limit: u32,
    ) -> Result<Vec<Message>, DomainError> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE session_id = $1
             ORDER BY created_at DESC, seq DESC LIMIT $2",
        )
        .bind(session_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(message_from_row).collect()
    }

    async fn delete_message(
        &self,
        session_id: Uuid,
        message_id: Uuid,
    ) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM messages WHERE session_id = $1 AND id = $2")
            .bind(session_id)
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        Ok(())
    }

    async fn delete_messages_batch(
        &self,
        session_id: Uuid,
        limit: u32,
    ) -> Result<u64, DomainError> {
        let deleted = sqlx::query(
            "DELETE FROM messages
             WHERE id IN (
                 SELECT id FROM messages
                 WHERE session_id = $1 ORDER BY seq LIMIT $2
             )",
        )
        .bind(session_id)
        .bind(i64::from(limit))
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        Ok(deleted.rows_affected())
    }

    async fn create_invite(&self, invite: NewInvite) -> Result<Invite, DomainError> {
        let id = Uuid::new_v4();
        let row = sqlx::query(
            "INSERT INTO invites
                 (id, session_id, sender, sender_name, recipient, recipient_email, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING created_at",
        )
        .bind(id)
        .bind(invite.session_id)
        .bind(invite.sender.as_str())
        .bind(&invite.sender_name)
        .bind(invite.recipient.as_str())
        .bind(&invite.recipient_email)
        .bind(InviteStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;

        Ok(Invite {
            id,
            session_id: invite.session_id,
            sender: invite.sender,
            sender_name: invite.sender_name,
            recipient: invite.recipient,
            recipient_email: invite.recipient_email,
            status: InviteStatus::Pending,
            created_at: row.try_get("created_at").map_err(internal)?,
        })
    }

    async fn get_invite(&self, id: Uuid) -> Result<Option<Invite>, DomainError> {
        let row = sqlx::query("SELECT * FROM invites WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(invite_from_row).transpose()
    }

    async fn set_invite_status(
        &self,
        id: Uuid,
        status: InviteStatus,
    ) -> Result<(), DomainError> {
        let updated = sqlx::query("UPDATE invites SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        if updated.rows_affected() == 0 {
            return Err(DomainError::not_found("invite", id));
        }
        Ok(())
    }

    async fn pending_invites_for(
        &self,
        recipient: &ParticipantId,
    ) -> Result<Vec<Invite>, DomainError> {
        let rows = sqlx::query(
            "SELECT * FROM invites
             WHERE recipient = $1 AND status = 'pending'
             ORDER BY created_at",
        )
        .bind(recipient.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(invite_from_row).collect()
    }
}
