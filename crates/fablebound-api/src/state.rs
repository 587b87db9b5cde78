//! Shared application state.

use std::sync::Arc;

use tokio::sync::mpsc;

use fablebound_content::SceneLibrary;
use fablebound_core::identity::IdentityProvider;
use fablebound_core::store::ContentStore;
use fablebound_narration::orchestrator::MessageCreated;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Content store for sessions, characters, messages and invites.
    pub store: Arc<dyn ContentStore>,
    /// Token-to-identity resolution.
    pub identities: Arc<dyn IdentityProvider>,
    /// Built-in campaign scenes.
    pub scenes: Arc<SceneLibrary>,
    /// Queue feeding the narration worker.
    pub narration_tx: mpsc::Sender<MessageCreated>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        store: Arc<dyn ContentStore>,
        identities: Arc<dyn IdentityProvider>,
        scenes: Arc<SceneLibrary>,
        narration_tx: mpsc::Sender<MessageCreated>,
    ) -> Self {
        Self {
            store,
            identities,
            scenes,
            narration_tx,
        }
    }
}
