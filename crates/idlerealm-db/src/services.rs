//! [`SaveService`] and [`PresenceService`] backed by `Dragonfly`.

use chrono::{DateTime, Utc};
use idlerealm_core::{GameState, PresenceService, SaveError, SaveService};
use idlerealm_types::{PlayerId, Position};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dragonfly::{DragonflyPool, presence_key, snapshot_key};

/// Stores one JSON snapshot per player at `player:{id}:snapshot`.
#[derive(Clone)]
pub struct DragonflySaveService {
    pool: DragonflyPool,
}

impl DragonflySaveService {
    /// Wrap a connected pool.
    pub const fn new(pool: DragonflyPool) -> Self {
        Self { pool }
    }
}

impl SaveService for DragonflySaveService {
    async fn save(&self, player_id: PlayerId, snapshot: &GameState) -> Result<(), SaveError> {
        self.pool
            .set_json(&snapshot_key(player_id), snapshot, None)
            .await?;
        debug!(%player_id, "Snapshot written");
        Ok(())
    }

    async fn load(&self, player_id: PlayerId) -> Result<Option<GameState>, SaveError> {
        Ok(self.pool.get_json(&snapshot_key(player_id)).await?)
    }
}

/// What a heartbeat records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    /// Where the player stood.
    pub position: Position,
    /// When the heartbeat was sent.
    pub seen_at: DateTime<Utc>,
}

/// Writes a short-lived presence record at `player:{id}:presence`.
///
/// The record expires after a few missed heartbeats, so a reader treats a
/// missing key as "offline".
#[derive(Clone)]
pub struct DragonflyPresence {
    pool: DragonflyPool,
    ttl_secs: u64,
}

impl DragonflyPresence {
    /// Heartbeats missed before the record expires.
    pub const MISSED_BEATS: u64 = 3;

    /// Wrap a connected pool for a heartbeat sent every `heartbeat_secs`.
    pub const fn new(pool: DragonflyPool, heartbeat_secs: u64) -> Self {
        Self {
            pool,
            ttl_secs: heartbeat_secs.saturating_mul(Self::MISSED_BEATS),
        }
    }

    /// Expiry applied to each record.
    pub const fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Read the player's current presence record.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] if the read fails or the record is malformed.
    pub async fn current(&self, player_id: PlayerId) -> Result<Option<PresenceRecord>, SaveError> {
        Ok(self.pool.get_json(&presence_key(player_id)).await?)
    }
}

impl PresenceService for DragonflyPresence {
    async fn heartbeat(&self, player_id: PlayerId, position: Position) -> Result<(), SaveError> {
        let record = PresenceRecord {
            position,
            seen_at: Utc::now(),
        };
        self.pool
            .set_json(&presence_key(player_id), &record, Some(self.ttl_secs))
            .await?;
        Ok(())
    }
}
