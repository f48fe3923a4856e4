//! Energy economy, characters, and equipment for Idlerealm.
//!
//! Everything here is synchronous and in-memory. Operations validate before
//! they mutate, so a returned [`PlayerError`] always leaves the state as it
//! was.
//!
//! # Modules
//!
//! - [`config`] -- Energy and equipment tunables with serde defaults.
//! - [`energy`] -- Spending, wall-clock regeneration, movement costs.
//! - [`equipment`] -- [`Character`] and [`Equipment`]: slots, equip /
//!   unequip / enchant, derived stat recomputation.
//! - [`error`] -- Error types for player operations.
//! - [`set_bonus`] -- Cumulative set bonus threshold tables.

pub mod config;
pub mod energy;
pub mod equipment;
pub mod error;
pub mod set_bonus;

pub use config::{EnergyConfig, EquipmentConfig};
pub use equipment::{Character, EnchantOutcome, EquipOutcome, Equipment};
pub use error::PlayerError;
pub use set_bonus::{SetBonusTable, SetTier};
