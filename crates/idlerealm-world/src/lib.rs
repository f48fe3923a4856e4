//! World generation, fog of war, map objects, and environmental cycles for
//! Idlerealm.
//!
//! Each player explores a private grid world that is regenerated every
//! daily epoch. This crate builds that world from a seed string and owns
//! every rule that mutates it afterwards.
//!
//! # Modules
//!
//! - [`cycle`] -- Lazy weather and day/night schedulers with one-step
//!   look-ahead and catch-up after long absences.
//! - [`error`] -- Error types for world-map operations.
//! - [`fog`] -- Fog-of-war reveal, path checks, and the discovered
//!   locations list.
//! - [`generator`] -- Deterministic terrain and object placement with
//!   relaxing separation.
//! - [`objects`] -- One-shot and re-arming interaction lifecycles.
//! - [`seed`] -- Seed-string hashing into a reproducible random stream.
//! - [`world_map`] -- The tile grid with its objects and cycle state.

pub mod cycle;
pub mod error;
pub mod fog;
pub mod generator;
pub mod objects;
pub mod seed;
pub mod world_map;

// Re-export primary types at crate root.
pub use cycle::{
    CycleCategory, CycleConfig, EnemyEligibility, WeatherWeights, advance_time_if_due,
    advance_weather_if_due, current_modifier,
};
pub use error::WorldError;
pub use fog::{Discoveries, RevealOutcome, check_path_explored, reveal, visible_locations};
pub use generator::{CAPITAL_NAME, WorldGenConfig, generate, movement_cost};
pub use objects::Consumption;
pub use world_map::WorldMap;
