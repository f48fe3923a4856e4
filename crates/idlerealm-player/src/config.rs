//! Tunables for the energy economy and the equipment engine.
//!
//! Both structs deserialize from the `energy` and `equipment` sections of
//! `idlerealm-config.yaml`; every field has a default so a partial section
//! is enough.

use serde::Deserialize;

use crate::set_bonus::SetBonusTable;

/// Energy economy parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnergyConfig {
    /// Regeneration cap (default: 100).
    #[serde(default = "default_max_energy")]
    pub max_energy: u32,

    /// Energy regenerated per hour (default: 10).
    #[serde(default = "default_regen_per_hour")]
    pub regen_per_hour: u32,

    /// Flat cost of entering a dungeon (default: 10).
    #[serde(default = "default_dungeon_cost")]
    pub dungeon_cost: u32,

    /// Flat cost of teleporting to a discovered location (default: 5).
    #[serde(default = "default_teleport_cost")]
    pub teleport_cost: u32,

    /// Flat cost of stepping through a portal (default: 3).
    #[serde(default = "default_portal_cost")]
    pub portal_cost: u32,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            max_energy: default_max_energy(),
            regen_per_hour: default_regen_per_hour(),
            dungeon_cost: default_dungeon_cost(),
            teleport_cost: default_teleport_cost(),
            portal_cost: default_portal_cost(),
        }
    }
}

const fn default_max_energy() -> u32 {
    100
}

const fn default_regen_per_hour() -> u32 {
    10
}

const fn default_dungeon_cost() -> u32 {
    10
}

const fn default_teleport_cost() -> u32 {
    5
}

const fn default_portal_cost() -> u32 {
    3
}

/// Equipment engine parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EquipmentConfig {
    /// Gold multiplier for enchanting: raising an item to level `n` costs
    /// `enchant_base_cost * n` (default: 100).
    #[serde(default = "default_enchant_base_cost")]
    pub enchant_base_cost: u64,

    /// Highest enchant level an item can reach (default: 10).
    #[serde(default = "default_max_enchant_level")]
    pub max_enchant_level: u32,

    /// Set bonus threshold tables (default: the built-in sets).
    #[serde(default)]
    pub set_bonuses: SetBonusTable,
}

impl Default for EquipmentConfig {
    fn default() -> Self {
        Self {
            enchant_base_cost: default_enchant_base_cost(),
            max_enchant_level: default_max_enchant_level(),
            set_bonuses: SetBonusTable::default(),
        }
    }
}

const fn default_enchant_base_cost() -> u64 {
    100
}

const fn default_max_enchant_level() -> u32 {
    10
}
