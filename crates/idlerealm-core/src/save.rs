//! Save and presence collaborator interfaces.
//!
//! The remote store is opaque: the engine only needs `save` / `load` with
//! eventual-consistency semantics, and a best-effort presence heartbeat.
//! [`MemorySaveService`] and [`MemoryPresence`] implement both in-process
//! for tests and offline play.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use idlerealm_types::{PlayerId, Position};
use tokio::sync::Mutex;

use crate::state::GameState;

/// Errors reported by a save or presence backend.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The backend could not be reached or rejected the request.
    #[error("save backend error: {message}")]
    Backend {
        /// Description from the backend.
        message: String,
    },

    /// The snapshot could not be encoded or decoded.
    #[error("snapshot serialization error: {source}")]
    Serialization {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

/// Persistence collaborator: stores one snapshot per player.
pub trait SaveService: Send + Sync {
    /// Persist `snapshot` as the player's latest state.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] if the write did not happen. The in-memory
    /// state stays authoritative either way.
    fn save(
        &self,
        player_id: PlayerId,
        snapshot: &GameState,
    ) -> impl Future<Output = Result<(), SaveError>> + Send;

    /// Load the player's latest snapshot, `None` if nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] if the backend fails or the stored document
    /// cannot be decoded.
    fn load(
        &self,
        player_id: PlayerId,
    ) -> impl Future<Output = Result<Option<GameState>, SaveError>> + Send;
}

/// Presence collaborator: best-effort "player is online here" signal.
pub trait PresenceService: Send + Sync {
    /// Announce the player's current position.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] on failure; callers log and ignore it.
    fn heartbeat(
        &self,
        player_id: PlayerId,
        position: Position,
    ) -> impl Future<Output = Result<(), SaveError>> + Send;
}

/// In-process save store. Snapshots are kept as JSON so every round trip
/// exercises the same encoding as a remote store.
#[derive(Debug, Default)]
pub struct MemorySaveService {
    documents: Mutex<HashMap<PlayerId, String>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemorySaveService {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every subsequent save fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.fail_saves.store(failing, Ordering::SeqCst);
    }

    /// The raw stored document, if any.
    pub async fn raw(&self, player_id: PlayerId) -> Option<String> {
        self.documents.lock().await.get(&player_id).cloned()
    }

    /// Store a raw document, as if another client had written it.
    pub async fn put_raw(&self, player_id: PlayerId, document: String) {
        self.documents.lock().await.insert(player_id, document);
    }
}

impl SaveService for MemorySaveService {
    async fn save(&self, player_id: PlayerId, snapshot: &GameState) -> Result<(), SaveError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(SaveError::Backend {
                message: "memory store set to fail".to_owned(),
            });
        }
        let document = serde_json::to_string(snapshot)?;
        self.documents.lock().await.insert(player_id, document);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self, player_id: PlayerId) -> Result<Option<GameState>, SaveError> {
        let documents = self.documents.lock().await;
        documents
            .get(&player_id)
            .map(|doc| serde_json::from_str(doc))
            .transpose()
            .map_err(SaveError::from)
    }
}

/// In-process presence sink that records every heartbeat.
#[derive(Debug, Default)]
pub struct MemoryPresence {
    beats: Mutex<Vec<(PlayerId, Position)>>,
}

impl MemoryPresence {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every heartbeat received, oldest first.
    pub async fn beats(&self) -> Vec<(PlayerId, Position)> {
        self.beats.lock().await.clone()
    }
}

impl PresenceService for MemoryPresence {
    async fn heartbeat(&self, player_id: PlayerId, position: Position) -> Result<(), SaveError> {
        self.beats.lock().await.push((player_id, position));
        Ok(())
    }
}
