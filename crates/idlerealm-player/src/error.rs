//! Error types for the idlerealm-player crate.
//!
//! Every rejection happens before any state is touched, so an `Err` always
//! means "nothing changed".

use idlerealm_types::{EquipmentSlot, ResourceKind};

/// Errors that can occur during energy or equipment operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    /// Not enough energy for the action.
    #[error("insufficient energy: need {required}, have {available} (short by {shortfall})")]
    InsufficientEnergy {
        /// Energy the action costs.
        required: u32,
        /// Energy the player holds.
        available: u32,
        /// `required - available`.
        shortfall: u32,
    },

    /// Not enough gold for the action.
    #[error("insufficient gold: need {required}, have {available}")]
    InsufficientGold {
        /// Gold the action costs.
        required: u64,
        /// Gold the player holds.
        available: u64,
    },

    /// The item's level exceeds the character's.
    #[error("item requires level {item_level}, character is level {character_level}")]
    LevelRequirement {
        /// Level the item requires.
        item_level: u32,
        /// The character's level.
        character_level: u32,
    },

    /// The slot holds no item.
    #[error("slot {0:?} is empty")]
    SlotEmpty(EquipmentSlot),

    /// The item in the slot is already at the enchant cap.
    #[error("item in slot {slot:?} is already at the maximum enchant level {max}")]
    MaxEnchant {
        /// The slot holding the item.
        slot: EquipmentSlot,
        /// The enchant cap.
        max: u32,
    },
}

impl PlayerError {
    /// The resource this error reports as insufficient, if any.
    pub const fn insufficient_resource(&self) -> Option<ResourceKind> {
        match self {
            Self::InsufficientEnergy { .. } => Some(ResourceKind::Energy),
            Self::InsufficientGold { .. } => Some(ResourceKind::Gold),
            Self::LevelRequirement { .. } | Self::SlotEmpty(_) | Self::MaxEnchant { .. } => None,
        }
    }
}
