//! Shared type definitions for the Idlerealm world and progression engine.
//!
//! This crate is the single source of truth for the data model used across
//! the workspace. Client-facing types flow downstream to `TypeScript` via
//! `ts-rs` for the game client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifiers (UUID newtypes and deterministic
//!   object ids)
//! - [`enums`] -- Terrain, weather, time of day, equipment slots, location
//!   and resource kinds
//! - [`structs`] -- Tiles, map objects, cycle state, energy, stats, items
//! - [`timestamp`] -- Lenient decoding of timestamps returned by the save
//!   store

pub mod enums;
pub mod ids;
pub mod structs;
pub mod timestamp;

// Re-export all public types at crate root for convenience.
pub use enums::{EquipmentSlot, ItemSlot, LocationKind, ResourceKind, Terrain, TimeOfDay, Weather};
pub use ids::{CharacterId, ItemId, ObjectId, PlayerId};
pub use structs::{
    CycleState, DiscoveredLocation, DynamicObject, DynamicObjectKind, ENCHANT_PERCENT_PER_LEVEL,
    EnergyState, Item, OneShot, Position, Rearming, StaticObject, StaticObjectKind, Stats, Tile,
};
pub use timestamp::TimestampError;

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. The files are written to the `bindings/`
        // directory relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::PlayerId::export_all();
        let _ = crate::ids::CharacterId::export_all();
        let _ = crate::ids::ItemId::export_all();
        let _ = crate::ids::ObjectId::export_all();

        // Enums
        let _ = crate::enums::Terrain::export_all();
        let _ = crate::enums::Weather::export_all();
        let _ = crate::enums::TimeOfDay::export_all();
        let _ = crate::enums::EquipmentSlot::export_all();
        let _ = crate::enums::ItemSlot::export_all();
        let _ = crate::enums::LocationKind::export_all();
        let _ = crate::enums::ResourceKind::export_all();

        // Structs
        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::Tile::export_all();
        let _ = crate::structs::OneShot::export_all();
        let _ = crate::structs::Rearming::export_all();
        let _ = crate::structs::StaticObject::export_all();
        let _ = crate::structs::StaticObjectKind::export_all();
        let _ = crate::structs::DynamicObject::export_all();
        let _ = crate::structs::DynamicObjectKind::export_all();
        let _ = crate::structs::DiscoveredLocation::export_all();
        let _ = crate::structs::EnergyState::export_all();
        let _ = crate::structs::Stats::export_all();
        let _ = crate::structs::Item::export_all();
    }
}
