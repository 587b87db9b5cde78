//! Narration worker.
//!
//! Message-created events are queued onto a channel and consumed here one
//! at a time. Delivery is at-least-once: redeliveries and stale events are
//! absorbed by the turn claim, so handling is idempotent. A handler error
//! is logged and the worker moves on; it never takes the queue down.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use fablebound_content::SceneLibrary;
use fablebound_core::narration::NarrationProvider;
use fablebound_core::store::ContentStore;
use fablebound_narration::orchestrator::{MessageCreated, handle_message_created};

/// Queue depth before producers start waiting.
const QUEUE_CAPACITY: usize = 64;

/// Spawns the narration worker and returns the producer side of its queue.
#[must_use]
pub fn spawn(
    store: Arc<dyn ContentStore>,
    provider: Arc<dyn NarrationProvider>,
    scenes: Arc<SceneLibrary>,
) -> (mpsc::Sender<MessageCreated>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<MessageCreated>(QUEUE_CAPACITY);

    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let message_id = event.message.id;
            let session_id = event.message.session_id;
            match handle_message_created(&event, &*store, &*provider, &scenes).await {
                Ok(outcome) => {
                    info!(%session_id, %message_id, ?outcome, "narration event handled");
                }
                Err(err) => {
                    error!(%session_id, %message_id, %err, "narration event failed");
                }
            }
        }
        info!("narration worker stopped");
    });

    (tx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use fablebound_core::character::NewCharacter;
    use fablebound_core::identity::Identity;
    use fablebound_core::message::{AuthorRole, NewMessage};
    use fablebound_core::participant::ParticipantId;
    use fablebound_core::store::ContentStore as _;
    use fablebound_membership::sessions::create_and_join_session;
    use fablebound_test_support::{FailingStore, FixedClock, MemoryStore, ScriptedNarrator};

    fn identity(id: &str) -> Identity {
        Identity {
            participant_id: ParticipantId::new(id),
            display_name: id.to_owned(),
            email: format!("{id}@example.com"),
        }
    }

    async fn wait_for_narration(store: &MemoryStore, session_id: uuid::Uuid) -> bool {
        for _ in 0..50 {
            let narrated = store
                .messages_ascending(session_id)
                .iter()
                .any(|m| m.author_role == AuthorRole::Narrator && !m.is_turn_announcement);
            if narrated {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_worker_narrates_queued_messages() {
        // Arrange
        let store = Arc::new(MemoryStore::new(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        ))));
        let narrator = Arc::new(ScriptedNarrator::new(&["The gate swings wide."]));
        let scenes = Arc::new(SceneLibrary::builtin());
        let alice = identity("alice");
        let session = create_and_join_session(
            &alice,
            NewCharacter {
                name: "Elyra".to_owned(),
                attributes: Default::default(),
            },
            &*store,
        )
        .await
        .unwrap();
        let message = store
            .append_message(NewMessage::participant(
                session.id,
                alice.participant_id.clone(),
                "Elyra".to_owned(),
                "I push the gate.".to_owned(),
                false,
            ))
            .await
            .unwrap();

        let (tx, handle) = spawn(store.clone(), narrator, scenes);

        // Act
        tx.send(MessageCreated { message }).await.unwrap();

        // Assert
        assert!(wait_for_narration(&store, session.id).await);
        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_survives_handler_failures() {
        // Arrange — a store that fails every call.
        let store = Arc::new(FailingStore);
        let narrator = Arc::new(ScriptedNarrator::new(&[]));
        let scenes = Arc::new(SceneLibrary::builtin());
        let message = fablebound_core::message::Message {
            id: uuid::Uuid::new_v4(),
            session_id: uuid::Uuid::new_v4(),
            author: ParticipantId::new("alice"),
            author_name: "Elyra".to_owned(),
            author_role: AuthorRole::Participant,
            body: "I act.".to_owned(),
            is_turn_announcement: false,
            is_adventure_start: false,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        };

        let (tx, handle) = spawn(store, narrator, scenes);

        // Act — two failing events, then close the queue.
        tx.send(MessageCreated {
            message: message.clone(),
        })
        .await
        .unwrap();
        tx.send(MessageCreated { message }).await.unwrap();
        drop(tx);

        // Assert — the worker drained the queue without panicking.
        handle.await.unwrap();
    }
}
