//! Configuration, game state, persistence scheduling, and the action facade
//! for Idlerealm.
//!
//! This crate ties the world and player crates into a playable session:
//! it loads configuration, owns the per-player state snapshot, debounces
//! its persistence, and exposes every player action through
//! [`GameSession`].
//!
//! # Modules
//!
//! - [`combat`] -- [`CombatResolver`] collaborator trait and the
//!   deterministic [`PowerCombatResolver`].
//! - [`config`] -- Configuration loading from `idlerealm-config.yaml` into
//!   strongly-typed structs.
//! - [`epoch`] -- The daily epoch key and world seed.
//! - [`error`] -- [`ActionError`] for rejected actions.
//! - [`outcome`] -- Results of successful actions.
//! - [`save`] -- Save and presence collaborator traits with in-memory
//!   implementations.
//! - [`session`] -- [`GameSession`]: travel, interactions, equipment, and
//!   lazy time-driven updates.
//! - [`state`] -- The persisted [`GameState`] snapshot.
//! - [`store`] -- [`WorldStateStore`] with watch-channel debounced flushing.
//! - [`timers`] -- The background timer loop.

pub mod combat;
pub mod config;
pub mod epoch;
pub mod error;
pub mod outcome;
pub mod save;
pub mod session;
pub mod state;
pub mod store;
pub mod timers;

pub use combat::{CombatOutcome, CombatResolver, PowerCombatResolver};
pub use config::{ConfigError, GameConfig};
pub use error::ActionError;
pub use outcome::{DungeonRun, InteractionOutcome, MoveOutcome, WorldTick};
pub use save::{MemoryPresence, MemorySaveService, PresenceService, SaveError, SaveService};
pub use session::GameSession;
pub use state::{GameState, PlayerState};
pub use store::{FlushHandle, WorldStateStore};
pub use timers::{Clock, SystemClock, run_timers};
