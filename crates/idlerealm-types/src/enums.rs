//! Enumeration types shared across the engine.
//!
//! Behaviour attached to these enums (movement costs, spawn modifiers,
//! slot resolution) lives in the crates that own that behaviour; this
//! module only fixes the vocabulary and its wire format.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// Terrain type of a single map tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Terrain {
    /// Open grassland, the cheapest terrain to cross.
    Plains,
    /// Woodland.
    Forest,
    /// Rolling hills.
    Hills,
    /// High mountains.
    Mountain,
    /// Sand and scrub.
    Desert,
    /// Marsh and bog.
    Swamp,
    /// Lakes and rivers. Passable but very expensive; never hosts objects
    /// when a dry tile is available.
    Water,
}

// ---------------------------------------------------------------------------
// Environmental cycles
// ---------------------------------------------------------------------------

/// Weather category driving the encounter spawn-rate multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Weather {
    /// Baseline spawn rate.
    Clear,
    /// Baseline spawn rate.
    Cloudy,
    /// Slightly more encounters.
    Rain,
    /// Noticeably more encounters.
    Fog,
    /// Many more encounters.
    Storm,
    /// Fewer encounters.
    Snow,
}

/// Phase of the four-step day/night ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TimeOfDay {
    /// Both day and night enemies roam.
    Dawn,
    /// Day enemies only.
    Day,
    /// Both day and night enemies roam.
    Dusk,
    /// Night enemies only.
    Night,
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

/// Physical equipment slot on a character.
///
/// The slot set is fixed; accessories occupy one of two physical slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EquipmentSlot {
    /// Head armour.
    Helmet,
    /// Main weapon.
    Weapon,
    /// Body armour.
    Chest,
    /// Hand armour.
    Gloves,
    /// Leg armour.
    Legs,
    /// Footwear.
    Boots,
    /// First accessory slot.
    Accessory1,
    /// Second accessory slot.
    Accessory2,
}

impl EquipmentSlot {
    /// Every physical slot, in display order.
    pub const ALL: [Self; 8] = [
        Self::Helmet,
        Self::Weapon,
        Self::Chest,
        Self::Gloves,
        Self::Legs,
        Self::Boots,
        Self::Accessory1,
        Self::Accessory2,
    ];
}

/// Logical slot declared by an item.
///
/// Maps one-to-one onto [`EquipmentSlot`] except for
/// [`ItemSlot::Accessory`], which may land in either accessory slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ItemSlot {
    /// Head armour.
    Helmet,
    /// Main weapon.
    Weapon,
    /// Body armour.
    Chest,
    /// Hand armour.
    Gloves,
    /// Leg armour.
    Legs,
    /// Footwear.
    Boots,
    /// Ring, amulet, or trinket.
    Accessory,
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Kind of a discovered location, mirroring the static object variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum LocationKind {
    /// A town.
    Town,
    /// The entrance of a dungeon.
    DungeonEntrance,
    /// One end of a linked portal pair.
    Portal,
    /// A concealed shortcut.
    HiddenPath,
    /// A treasure chest.
    TreasureChest,
    /// A rare monster lair.
    RareSpawn,
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A spendable player resource, used in insufficient-resource reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ResourceKind {
    /// Action energy.
    Energy,
    /// Gold currency.
    Gold,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equipment_slots_are_unique() {
        let mut slots = EquipmentSlot::ALL.to_vec();
        slots.sort();
        slots.dedup();
        assert_eq!(slots.len(), 8);
    }

    #[test]
    fn enums_serialize_snake_case() {
        let json = serde_json::to_string(&LocationKind::DungeonEntrance).ok();
        assert_eq!(json.as_deref(), Some("\"dungeon_entrance\""));
        let json = serde_json::to_string(&EquipmentSlot::Accessory2).ok();
        assert_eq!(json.as_deref(), Some("\"accessory2\""));
    }
}
