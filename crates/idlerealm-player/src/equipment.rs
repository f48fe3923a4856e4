//! Characters, equipment slots, and derived stat recomputation.
//!
//! A [`Character`]'s effective stats are always
//! `base_stats + sum(item.effective_stats()) + set bonuses`, recomputed
//! synchronously after every slot mutation. When the recomputation lowers
//! max HP, current HP is clamped down; raising max HP never heals.
//!
//! Slot resolution: every item slot maps to its physical slot, except
//! accessories, which take the first empty of `accessory1` / `accessory2`
//! and otherwise replace `accessory1`.

use std::collections::BTreeMap;

use idlerealm_types::{CharacterId, EquipmentSlot, Item, ItemSlot, Stats};
use serde::{Deserialize, Serialize};

use crate::config::EquipmentConfig;
use crate::error::PlayerError;
use crate::set_bonus::SetBonusTable;

/// Persisted shape of [`Equipment`]: just the slots.
type SlotMap = BTreeMap<EquipmentSlot, Option<Item>>;

/// The eight equipment slots of one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SlotMap", into = "SlotMap")]
pub struct Equipment {
    slots: SlotMap,
    /// Pieces worn per set, derived from `slots`.
    equipped_sets: BTreeMap<String, u32>,
}

impl Default for Equipment {
    fn default() -> Self {
        Self::new()
    }
}

impl From<SlotMap> for Equipment {
    fn from(mut slots: SlotMap) -> Self {
        for slot in EquipmentSlot::ALL {
            slots.entry(slot).or_insert(None);
        }
        let mut equipment = Self {
            slots,
            equipped_sets: BTreeMap::new(),
        };
        equipment.recount_sets();
        equipment
    }
}

impl From<Equipment> for SlotMap {
    fn from(equipment: Equipment) -> Self {
        equipment.slots
    }
}

impl Equipment {
    /// Eight empty slots.
    pub fn new() -> Self {
        Self::from(SlotMap::new())
    }

    /// The item in `slot`, if any.
    pub fn get(&self, slot: EquipmentSlot) -> Option<&Item> {
        self.slots.get(&slot).and_then(Option::as_ref)
    }

    /// Every equipped item with its slot, in slot order.
    pub fn items(&self) -> impl Iterator<Item = (EquipmentSlot, &Item)> {
        self.slots
            .iter()
            .filter_map(|(&slot, item)| item.as_ref().map(|i| (slot, i)))
    }

    /// Pieces worn per set.
    pub const fn equipped_sets(&self) -> &BTreeMap<String, u32> {
        &self.equipped_sets
    }

    /// The physical slot an item of `item_slot` would occupy.
    pub fn resolve_slot(&self, item_slot: ItemSlot) -> EquipmentSlot {
        match item_slot {
            ItemSlot::Helmet => EquipmentSlot::Helmet,
            ItemSlot::Weapon => EquipmentSlot::Weapon,
            ItemSlot::Chest => EquipmentSlot::Chest,
            ItemSlot::Gloves => EquipmentSlot::Gloves,
            ItemSlot::Legs => EquipmentSlot::Legs,
            ItemSlot::Boots => EquipmentSlot::Boots,
            ItemSlot::Accessory => {
                if self.get(EquipmentSlot::Accessory1).is_none() {
                    EquipmentSlot::Accessory1
                } else if self.get(EquipmentSlot::Accessory2).is_none() {
                    EquipmentSlot::Accessory2
                } else {
                    EquipmentSlot::Accessory1
                }
            }
        }
    }

    /// Sum of every equipped item's enchant-scaled stats.
    pub fn item_stats(&self) -> Stats {
        self.items()
            .fold(Stats::ZERO, |total, (_, item)| total.plus(item.effective_stats()))
    }

    fn put(&mut self, slot: EquipmentSlot, item: Item) -> Option<Item> {
        let previous = self.slots.insert(slot, Some(item)).flatten();
        self.recount_sets();
        previous
    }

    fn take(&mut self, slot: EquipmentSlot) -> Option<Item> {
        let removed = self.slots.get_mut(&slot).and_then(Option::take);
        self.recount_sets();
        removed
    }

    fn get_mut(&mut self, slot: EquipmentSlot) -> Option<&mut Item> {
        self.slots.get_mut(&slot).and_then(Option::as_mut)
    }

    fn recount_sets(&mut self) {
        let mut sets: BTreeMap<String, u32> = BTreeMap::new();
        for item in self.slots.values().flatten() {
            if let Some(set_id) = &item.set_id {
                let count = sets.entry(set_id.clone()).or_insert(0);
                *count = count.saturating_add(1);
            }
        }
        self.equipped_sets = sets;
    }
}

/// Result of [`Character::equip`].
#[derive(Debug, Clone, PartialEq)]
pub struct EquipOutcome {
    /// The physical slot the item went into.
    pub slot: EquipmentSlot,
    /// The item that was displaced, if the slot was occupied.
    pub unequipped: Option<Item>,
}

/// Result of [`Character::enchant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnchantOutcome {
    /// The item's new enchant level.
    pub enchant_level: u32,
    /// Gold deducted.
    pub gold_spent: u64,
}

/// A party member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Unique id.
    pub id: CharacterId,
    /// Display name.
    pub name: String,
    /// Character level; gates which items can be equipped.
    pub level: u32,
    /// Stats before equipment.
    pub base_stats: Stats,
    current_hp: u32,
    #[serde(default)]
    equipment: Equipment,
    #[serde(default)]
    stats: Stats,
}

impl Character {
    /// A new character at full health with nothing equipped.
    pub fn new(name: impl Into<String>, level: u32, base_stats: Stats) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            level,
            base_stats,
            current_hp: base_stats.hp,
            equipment: Equipment::new(),
            stats: base_stats,
        }
    }

    /// Effective stats as of the last recomputation.
    pub const fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Current hit points, never above `stats().hp`.
    pub const fn current_hp(&self) -> u32 {
        self.current_hp
    }

    /// Set current hit points (after combat), clamped to max HP.
    pub fn set_current_hp(&mut self, hp: u32) {
        self.current_hp = hp.min(self.stats.hp);
    }

    /// The character's equipment.
    pub const fn equipment(&self) -> &Equipment {
        &self.equipment
    }

    /// Sorting score of the effective stats.
    pub fn power_score(&self) -> f64 {
        self.stats.power_score()
    }

    /// Recompute effective stats from base, items, and set bonuses.
    ///
    /// Idempotent. Clamps current HP when max HP drops.
    pub fn recalculate_stats(&mut self, bonuses: &SetBonusTable) {
        self.stats = self
            .base_stats
            .plus(self.equipment.item_stats())
            .plus(bonuses.total(self.equipment.equipped_sets()));
        self.current_hp = self.current_hp.min(self.stats.hp);
    }

    /// Equip `item`, returning whatever it displaced.
    ///
    /// # Errors
    ///
    /// [`PlayerError::LevelRequirement`] if the item's level exceeds the
    /// character's; nothing changes.
    pub fn equip(
        &mut self,
        item: Item,
        bonuses: &SetBonusTable,
    ) -> Result<EquipOutcome, PlayerError> {
        if item.level > self.level {
            return Err(PlayerError::LevelRequirement {
                item_level: item.level,
                character_level: self.level,
            });
        }
        let slot = self.equipment.resolve_slot(item.slot);
        let item_id = item.id;
        let unequipped = self.equipment.put(slot, item);
        self.recalculate_stats(bonuses);
        tracing::debug!(
            character = %self.id,
            item = %item_id,
            slot = ?slot,
            displaced = unequipped.is_some(),
            "Item equipped"
        );
        Ok(EquipOutcome { slot, unequipped })
    }

    /// Remove and return the item in `slot`.
    ///
    /// # Errors
    ///
    /// [`PlayerError::SlotEmpty`] if there is nothing to remove.
    pub fn unequip(
        &mut self,
        slot: EquipmentSlot,
        bonuses: &SetBonusTable,
    ) -> Result<Item, PlayerError> {
        let item = self
            .equipment
            .take(slot)
            .ok_or(PlayerError::SlotEmpty(slot))?;
        self.recalculate_stats(bonuses);
        tracing::debug!(character = %self.id, item = %item.id, slot = ?slot, "Item unequipped");
        Ok(item)
    }

    /// Raise the enchant level of the item in `slot` by one, paying gold.
    ///
    /// The cost of reaching level `n` is `enchant_base_cost * n`.
    ///
    /// # Errors
    ///
    /// [`PlayerError::SlotEmpty`], [`PlayerError::MaxEnchant`], or
    /// [`PlayerError::InsufficientGold`]; neither the item nor `gold`
    /// changes.
    pub fn enchant(
        &mut self,
        slot: EquipmentSlot,
        gold: &mut u64,
        config: &EquipmentConfig,
    ) -> Result<EnchantOutcome, PlayerError> {
        let item = self
            .equipment
            .get_mut(slot)
            .ok_or(PlayerError::SlotEmpty(slot))?;
        if item.enchant_level >= config.max_enchant_level {
            return Err(PlayerError::MaxEnchant {
                slot,
                max: config.max_enchant_level,
            });
        }
        let next_level = item.enchant_level.saturating_add(1);
        let cost = config.enchant_base_cost.saturating_mul(u64::from(next_level));
        if *gold < cost {
            return Err(PlayerError::InsufficientGold {
                required: cost,
                available: *gold,
            });
        }
        *gold = gold.saturating_sub(cost);
        item.enchant_level = next_level;
        self.recalculate_stats(&config.set_bonuses);
        tracing::debug!(character = %self.id, slot = ?slot, level = next_level, cost, "Item enchanted");
        Ok(EnchantOutcome {
            enchant_level: next_level,
            gold_spent: cost,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use idlerealm_types::ItemId;

    use super::*;

    fn base() -> Stats {
        Stats {
            hp: 100,
            atk: 10,
            def: 5,
            spd: 8,
            crit: 1.0,
        }
    }

    fn item(slot: ItemSlot, stats: Stats, set_id: Option<&str>) -> Item {
        Item {
            id: ItemId::new(),
            name: format!("{slot:?}"),
            level: 1,
            slot,
            set_id: set_id.map(str::to_owned),
            enchant_level: 0,
            base_stats: stats,
        }
    }

    fn hp(hp: u32) -> Stats {
        Stats {
            hp,
            ..Stats::ZERO
        }
    }

    #[test]
    fn helmet_raises_and_unequip_clamps_hp() {
        let table = SetBonusTable::empty();
        let mut hero = Character::new("Ayla", 5, base());
        hero.equip(item(ItemSlot::Helmet, hp(20), None), &table).unwrap();
        assert_eq!(hero.stats().hp, 120);
        // Raising max HP does not heal.
        assert_eq!(hero.current_hp(), 100);
        hero.set_current_hp(120);
        assert_eq!(hero.current_hp(), 120);

        let removed = hero.unequip(EquipmentSlot::Helmet, &table).unwrap();
        assert_eq!(removed.base_stats.hp, 20);
        assert_eq!(hero.stats().hp, 100);
        assert_eq!(hero.current_hp(), 100);
    }

    #[test]
    fn level_requirement_rejects_without_change() {
        let table = SetBonusTable::empty();
        let mut hero = Character::new("Ayla", 2, base());
        let mut heavy = item(ItemSlot::Chest, hp(50), None);
        heavy.level = 3;
        let before = hero.clone();
        assert_eq!(
            hero.equip(heavy, &table),
            Err(PlayerError::LevelRequirement {
                item_level: 3,
                character_level: 2,
            })
        );
        assert_eq!(hero, before);
    }

    #[test]
    fn equip_returns_displaced_item() {
        let table = SetBonusTable::empty();
        let mut hero = Character::new("Ayla", 5, base());
        let first = item(ItemSlot::Weapon, Stats { atk: 5, ..Stats::ZERO }, None);
        let first_id = first.id;
        hero.equip(first, &table).unwrap();
        let outcome = hero
            .equip(item(ItemSlot::Weapon, Stats { atk: 9, ..Stats::ZERO }, None), &table)
            .unwrap();
        assert_eq!(outcome.slot, EquipmentSlot::Weapon);
        assert_eq!(outcome.unequipped.unwrap().id, first_id);
        assert_eq!(hero.stats().atk, 19);
    }

    #[test]
    fn accessories_fill_then_overwrite_first() {
        let table = SetBonusTable::empty();
        let mut hero = Character::new("Ayla", 5, base());
        let a = hero
            .equip(item(ItemSlot::Accessory, Stats::ZERO, None), &table)
            .unwrap();
        let b = hero
            .equip(item(ItemSlot::Accessory, Stats::ZERO, None), &table)
            .unwrap();
        let c = hero
            .equip(item(ItemSlot::Accessory, Stats::ZERO, None), &table)
            .unwrap();
        assert_eq!(a.slot, EquipmentSlot::Accessory1);
        assert_eq!(b.slot, EquipmentSlot::Accessory2);
        assert_eq!(c.slot, EquipmentSlot::Accessory1);
        assert!(c.unequipped.is_some());
    }

    #[test]
    fn set_bonuses_are_additive_across_sets() {
        let table = SetBonusTable::standard();
        let mut hero = Character::new("Ayla", 5, base());
        hero.equip(item(ItemSlot::Helmet, Stats::ZERO, Some("iron_guard")), &table)
            .unwrap();
        hero.equip(item(ItemSlot::Chest, Stats::ZERO, Some("iron_guard")), &table)
            .unwrap();
        hero.equip(item(ItemSlot::Gloves, Stats::ZERO, Some("shadow_stalker")), &table)
            .unwrap();
        hero.equip(item(ItemSlot::Boots, Stats::ZERO, Some("shadow_stalker")), &table)
            .unwrap();
        assert_eq!(hero.equipment().equipped_sets().get("iron_guard"), Some(&2));
        let expected = base()
            .plus(table.bonus_for("iron_guard", 2))
            .plus(table.bonus_for("shadow_stalker", 2));
        assert_eq!(*hero.stats(), expected);

        hero.unequip(EquipmentSlot::Boots, &table).unwrap();
        assert_eq!(*hero.stats(), base().plus(table.bonus_for("iron_guard", 2)));
    }

    #[test]
    fn recalculation_is_idempotent() {
        let table = SetBonusTable::standard();
        let mut hero = Character::new("Ayla", 5, base());
        hero.equip(item(ItemSlot::Legs, hp(15), Some("dragon_scale")), &table)
            .unwrap();
        let once = hero.clone();
        hero.recalculate_stats(&table);
        hero.recalculate_stats(&table);
        assert_eq!(hero, once);
    }

    #[test]
    fn enchant_costs_gold_and_scales_stats() {
        let config = EquipmentConfig::default();
        let mut hero = Character::new("Ayla", 5, base());
        hero.equip(
            item(ItemSlot::Weapon, Stats { atk: 20, ..Stats::ZERO }, None),
            &config.set_bonuses,
        )
        .unwrap();

        let mut gold = 150;
        let outcome = hero.enchant(EquipmentSlot::Weapon, &mut gold, &config).unwrap();
        assert_eq!(outcome, EnchantOutcome { enchant_level: 1, gold_spent: 100 });
        assert_eq!(gold, 50);
        assert_eq!(hero.stats().atk, 10 + 22);

        let before = hero.clone();
        assert_eq!(
            hero.enchant(EquipmentSlot::Weapon, &mut gold, &config),
            Err(PlayerError::InsufficientGold {
                required: 200,
                available: 50,
            })
        );
        assert_eq!(gold, 50);
        assert_eq!(hero, before);

        assert_eq!(
            hero.enchant(EquipmentSlot::Helmet, &mut gold, &config),
            Err(PlayerError::SlotEmpty(EquipmentSlot::Helmet))
        );
    }

    #[test]
    fn enchant_stops_at_cap() {
        let config = EquipmentConfig {
            max_enchant_level: 1,
            ..EquipmentConfig::default()
        };
        let mut hero = Character::new("Ayla", 5, base());
        hero.equip(item(ItemSlot::Boots, Stats::ZERO, None), &config.set_bonuses)
            .unwrap();
        let mut gold = 10_000;
        hero.enchant(EquipmentSlot::Boots, &mut gold, &config).unwrap();
        assert!(matches!(
            hero.enchant(EquipmentSlot::Boots, &mut gold, &config),
            Err(PlayerError::MaxEnchant { max: 1, .. })
        ));
    }

    #[test]
    fn equipment_roundtrip_rebuilds_sets() {
        let table = SetBonusTable::standard();
        let mut hero = Character::new("Ayla", 5, base());
        hero.equip(item(ItemSlot::Helmet, Stats::ZERO, Some("iron_guard")), &table)
            .unwrap();
        let json = serde_json::to_string(&hero).unwrap();
        let back: Character = serde_json::from_str(&json).unwrap();
        assert_eq!(back.equipment().equipped_sets().get("iron_guard"), Some(&1));
        assert_eq!(back, hero);
    }
}
