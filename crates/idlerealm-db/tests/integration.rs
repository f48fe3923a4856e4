//! Integration tests for the `idlerealm-db` data layer.
//!
//! These tests require a live Dragonfly instance. Run with:
//!
//! ```bash
//! docker run -d -p 6379:6379 docker.dragonflydb.io/dragonflydb/dragonfly
//! cargo test -p idlerealm-db -- --ignored
//! ```
//!
//! All tests are marked `#[ignore]` so they are skipped during normal
//! `cargo test` runs.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::missing_panics_doc)]

use chrono::{DateTime, Utc};
use idlerealm_core::{GameConfig, GameState, PresenceService, SaveService};
use idlerealm_db::dragonfly::{presence_key, snapshot_key};
use idlerealm_db::{DragonflyPool, DragonflyPresence, DragonflySaveService};
use idlerealm_types::{PlayerId, Position};

/// Dragonfly connection URL for the local Docker instance.
const DRAGONFLY_URL: &str = "redis://localhost:6379";

async fn setup() -> DragonflyPool {
    DragonflyPool::connect(DRAGONFLY_URL)
        .await
        .expect("Failed to connect to Dragonfly -- is Docker running?")
}

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-01-01T08:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

#[tokio::test]
#[ignore = "requires Dragonfly"]
async fn snapshot_roundtrip() {
    let pool = setup().await;
    let service = DragonflySaveService::new(pool.clone());
    let player_id = PlayerId::new();
    let state = GameState::new(player_id, &GameConfig::default(), now());

    service.save(player_id, &state).await.unwrap();
    let loaded = service.load(player_id).await.unwrap().expect("snapshot stored");
    assert_eq!(loaded, state);

    pool.delete(&snapshot_key(player_id)).await.unwrap();
}

#[tokio::test]
#[ignore = "requires Dragonfly"]
async fn missing_snapshot_loads_as_none() {
    let pool = setup().await;
    let service = DragonflySaveService::new(pool);
    assert!(service.load(PlayerId::new()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Dragonfly"]
async fn corrupt_snapshot_is_a_serialization_error() {
    let pool = setup().await;
    let player_id = PlayerId::new();
    let key = snapshot_key(player_id);
    pool.set_json(&key, &"not a game state", None).await.unwrap();

    let service = DragonflySaveService::new(pool.clone());
    let err = service.load(player_id).await.unwrap_err();
    assert!(matches!(err, idlerealm_core::SaveError::Serialization { .. }));

    pool.delete(&key).await.unwrap();
}

#[tokio::test]
#[ignore = "requires Dragonfly"]
async fn presence_expires_after_missed_heartbeats() {
    let pool = setup().await;
    let presence = DragonflyPresence::new(pool.clone(), 15);
    let player_id = PlayerId::new();
    let position = Position { x: 3, y: 4 };

    presence.heartbeat(player_id, position).await.unwrap();

    let record = presence.current(player_id).await.unwrap().expect("record");
    assert_eq!(record.position, position);
    let ttl = pool.ttl(&presence_key(player_id)).await.unwrap().expect("ttl");
    assert!(ttl > 0 && ttl <= 45);

    pool.delete(&presence_key(player_id)).await.unwrap();
}
