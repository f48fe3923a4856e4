//! The world state store: in-memory state with debounced persistence.
//!
//! Every mutator bumps a monotonically increasing revision and publishes
//! the new snapshot on a [`watch`] channel. A single background flusher
//! waits for a change, sleeps the debounce delay, then saves whatever
//! snapshot is newest at that moment, so a burst of mutations becomes one
//! write. The flusher records the last revision it persisted; the state is
//! dirty while `revision > flushed`.
//!
//! Saves are serialised through one lock and skip any revision that is not
//! newer than what is already stored, so an immediate [`flush_now`] and a
//! background flush can never write an older snapshot over a newer one.
//!
//! [`flush_now`]: WorldStateStore::flush_now

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use idlerealm_player::Character;
use idlerealm_types::{CharacterId, DiscoveredLocation, EnergyState, PlayerId, Position};
use idlerealm_world::WorldMap;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::save::{SaveError, SaveService};
use crate::state::GameState;

/// A published snapshot: the revision and the state at that revision.
type Snapshot = (u64, Arc<GameState>);

/// State shared between the store, its flusher task and flush handles.
struct FlushShared<S> {
    saver: Arc<S>,
    player_id: PlayerId,
    flushed: AtomicU64,
    save_lock: Mutex<()>,
}

impl<S: SaveService> FlushShared<S> {
    /// Save `snapshot` unless a revision at least as new is already stored.
    ///
    /// Returns `true` if a write happened.
    async fn persist(&self, revision: u64, snapshot: &GameState) -> Result<bool, SaveError> {
        let _guard = self.save_lock.lock().await;
        if revision <= self.flushed.load(Ordering::Acquire) {
            return Ok(false);
        }
        self.saver.save(self.player_id, snapshot).await?;
        self.flushed.store(revision, Ordering::Release);
        info!(player_id = %self.player_id, revision, "State flushed");
        Ok(true)
    }
}

/// A snapshot taken from the store that can be saved without holding any
/// borrow of it.
///
/// Lets a caller that keeps the session behind a lock release the lock
/// before awaiting the network.
pub struct FlushHandle<S> {
    shared: Arc<FlushShared<S>>,
    revision: u64,
    snapshot: Arc<GameState>,
}

impl<S: SaveService> FlushHandle<S> {
    /// The revision this handle will persist.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Persist the snapshot. Returns `false` if nothing needed saving.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] if the save collaborator fails.
    pub async fn flush(self) -> Result<bool, SaveError> {
        self.shared.persist(self.revision, &self.snapshot).await
    }
}

/// Owns the composed game state and schedules its persistence.
pub struct WorldStateStore<S> {
    state: Arc<GameState>,
    revision: u64,
    snapshots: watch::Sender<Snapshot>,
    shared: Arc<FlushShared<S>>,
}

impl<S: SaveService + 'static> WorldStateStore<S> {
    /// Wrap `state` (treated as already persisted) and start the flusher.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(state: GameState, saver: Arc<S>, debounce: Duration) -> Self {
        let player_id = state.player.player_id;
        let state = Arc::new(state);
        let (snapshots, receiver) = watch::channel((0, Arc::clone(&state)));
        let shared = Arc::new(FlushShared {
            saver,
            player_id,
            flushed: AtomicU64::new(0),
            save_lock: Mutex::new(()),
        });
        tokio::spawn(run_flusher(Arc::clone(&shared), receiver, debounce));
        debug!(%player_id, debounce_ms = debounce.as_millis(), "State store started");
        Self {
            state,
            revision: 0,
            snapshots,
            shared,
        }
    }
}

impl<S: SaveService> WorldStateStore<S> {
    /// The current state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The revision of the current state.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// The newest revision known to be persisted.
    pub fn flushed_revision(&self) -> u64 {
        self.shared.flushed.load(Ordering::Acquire)
    }

    /// Whether there are mutations not yet persisted.
    pub fn is_dirty(&self) -> bool {
        self.revision > self.flushed_revision()
    }

    /// Apply `f`, then mark dirty and schedule a flush.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut GameState) -> R) -> R {
        let out = f(Arc::make_mut(&mut self.state));
        self.publish();
        out
    }

    fn publish(&mut self) {
        self.revision = self.revision.saturating_add(1);
        self.snapshots
            .send_replace((self.revision, Arc::clone(&self.state)));
    }

    /// Apply a fallible compound mutation as one revision.
    ///
    /// `f` must leave the state untouched when it returns `Err`; nothing is
    /// published in that case.
    pub fn try_update<R, E>(
        &mut self,
        f: impl FnOnce(&mut GameState) -> Result<R, E>,
    ) -> Result<R, E> {
        let out = f(Arc::make_mut(&mut self.state))?;
        self.publish();
        Ok(out)
    }

    /// Replace the world map.
    pub fn replace_world_map(&mut self, map: WorldMap) {
        self.update(|s| s.world = Some(map));
    }

    /// Mutate the world map in place. Returns `None` (and changes nothing)
    /// if there is no map.
    pub fn update_world_map<R>(&mut self, f: impl FnOnce(&mut WorldMap) -> R) -> Option<R> {
        if self.state.world.is_none() {
            return None;
        }
        self.update(|s| s.world.as_mut().map(f))
    }

    /// Move the player.
    pub fn update_player_pos(&mut self, position: Position) {
        self.update(|s| s.player.position = position);
    }

    /// Overwrite the energy state.
    pub fn set_energy(&mut self, energy: EnergyState) {
        self.update(|s| s.player.energy = energy);
    }

    /// Append locations to the discovered list, skipping known positions.
    ///
    /// Returns how many were new. Nothing is published if none were.
    pub fn add_discovered_locations<I>(&mut self, locations: I) -> usize
    where
        I: IntoIterator<Item = DiscoveredLocation>,
    {
        let fresh: Vec<DiscoveredLocation> = locations
            .into_iter()
            .filter(|l| !self.state.player.discoveries.contains(l.position()))
            .collect();
        if fresh.is_empty() {
            return 0;
        }
        self.update(|s| s.player.discoveries.extend(fresh))
    }

    /// Clear the discovered list and start over from `locations`.
    pub fn reset_discoveries(&mut self, locations: Vec<DiscoveredLocation>) {
        self.update(|s| {
            s.player.discoveries = idlerealm_world::Discoveries::new();
            s.player.discoveries.extend(locations);
        });
    }

    /// Mutate one party member. Returns `None` if no member has `id`.
    pub fn update_character<R>(
        &mut self,
        id: CharacterId,
        f: impl FnOnce(&mut Character) -> R,
    ) -> Option<R> {
        if self.state.player.character(id).is_none() {
            return None;
        }
        self.update(|s| s.player.character_mut(id).map(f))
    }

    /// Overwrite the gold balance.
    pub fn set_gold(&mut self, gold: u64) {
        self.update(|s| s.player.gold = gold);
    }

    /// Replace the whole state.
    pub fn replace_state(&mut self, state: GameState) {
        self.update(|s| *s = state);
    }

    /// Take the current snapshot for saving outside any borrow of the store.
    pub fn flush_handle(&self) -> FlushHandle<S> {
        FlushHandle {
            shared: Arc::clone(&self.shared),
            revision: self.revision,
            snapshot: Arc::clone(&self.state),
        }
    }

    /// Persist the current state immediately, bypassing the debounce.
    ///
    /// Returns `false` if it was already persisted.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] if the save collaborator fails.
    pub async fn flush_now(&self) -> Result<bool, SaveError> {
        self.flush_handle().flush().await
    }
}

/// Background task: one debounced save per burst of mutations.
///
/// Exits when the store (the sender) is dropped.
async fn run_flusher<S: SaveService>(
    shared: Arc<FlushShared<S>>,
    mut receiver: watch::Receiver<Snapshot>,
    debounce: Duration,
) {
    while receiver.changed().await.is_ok() {
        tokio::time::sleep(debounce).await;
        let (revision, snapshot) = receiver.borrow_and_update().clone();
        if let Err(e) = shared.persist(revision, &snapshot).await {
            warn!(
                player_id = %shared.player_id,
                revision,
                error = %e,
                "Flush failed, state stays dirty"
            );
        }
    }
    debug!(player_id = %shared.player_id, "Flusher stopped");
}
