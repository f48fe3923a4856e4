//! Equipment set bonuses.
//!
//! A set bonus table maps each `set_id` to an ordered list of tiers. A tier
//! applies once the character wears at least `pieces` items of that set.
//! Tiers are cumulative: a character wearing four pieces of a set with
//! two- and four-piece tiers gets both. Bonuses from different sets simply
//! add up.

use std::collections::BTreeMap;

use idlerealm_types::Stats;
use serde::Deserialize;

/// One threshold of a set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetTier {
    /// Pieces of the set required.
    pub pieces: u32,
    /// Stats granted once the threshold is reached.
    pub bonus: Stats,
}

/// Set bonus thresholds keyed by `set_id`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct SetBonusTable {
    sets: BTreeMap<String, Vec<SetTier>>,
}

impl Default for SetBonusTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl SetBonusTable {
    /// An empty table: no set grants anything.
    pub const fn empty() -> Self {
        Self {
            sets: BTreeMap::new(),
        }
    }

    /// The built-in sets.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.insert(
            "iron_guard",
            vec![
                SetTier {
                    pieces: 2,
                    bonus: Stats {
                        def: 10,
                        ..Stats::ZERO
                    },
                },
                SetTier {
                    pieces: 4,
                    bonus: Stats {
                        hp: 50,
                        def: 20,
                        ..Stats::ZERO
                    },
                },
            ],
        );
        table.insert(
            "shadow_stalker",
            vec![
                SetTier {
                    pieces: 2,
                    bonus: Stats {
                        spd: 5,
                        crit: 2.0,
                        ..Stats::ZERO
                    },
                },
                SetTier {
                    pieces: 4,
                    bonus: Stats {
                        atk: 25,
                        crit: 5.0,
                        ..Stats::ZERO
                    },
                },
            ],
        );
        table.insert(
            "dragon_scale",
            vec![
                SetTier {
                    pieces: 2,
                    bonus: Stats {
                        hp: 40,
                        ..Stats::ZERO
                    },
                },
                SetTier {
                    pieces: 3,
                    bonus: Stats {
                        atk: 15,
                        def: 15,
                        ..Stats::ZERO
                    },
                },
                SetTier {
                    pieces: 5,
                    bonus: Stats {
                        hp: 100,
                        atk: 30,
                        def: 30,
                        spd: 10,
                        crit: 5.0,
                    },
                },
            ],
        );
        table
    }

    /// Add or replace the tiers of a set.
    pub fn insert(&mut self, set_id: impl Into<String>, tiers: Vec<SetTier>) {
        self.sets.insert(set_id.into(), tiers);
    }

    /// Bonus for wearing `count` pieces of `set_id`: the sum of every tier
    /// whose threshold is reached. Unknown sets grant nothing.
    pub fn bonus_for(&self, set_id: &str, count: u32) -> Stats {
        self.sets.get(set_id).map_or(Stats::ZERO, |tiers| {
            tiers
                .iter()
                .filter(|tier| count >= tier.pieces)
                .fold(Stats::ZERO, |total, tier| total.plus(tier.bonus))
        })
    }

    /// Total bonus over every equipped set.
    pub fn total<'a, I>(&self, equipped_sets: I) -> Stats
    where
        I: IntoIterator<Item = (&'a String, &'a u32)>,
    {
        equipped_sets
            .into_iter()
            .fold(Stats::ZERO, |total, (set_id, &count)| {
                total.plus(self.bonus_for(set_id, count))
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_cumulative() {
        let table = SetBonusTable::standard();
        assert_eq!(table.bonus_for("iron_guard", 1), Stats::ZERO);
        assert_eq!(table.bonus_for("iron_guard", 2).def, 10);
        let four = table.bonus_for("iron_guard", 4);
        assert_eq!(four.def, 30);
        assert_eq!(four.hp, 50);
    }

    #[test]
    fn unknown_set_grants_nothing() {
        assert_eq!(SetBonusTable::standard().bonus_for("nope", 8), Stats::ZERO);
    }

    #[test]
    fn sets_compose_additively() {
        let table = SetBonusTable::standard();
        let mut sets = BTreeMap::new();
        sets.insert("iron_guard".to_owned(), 2);
        sets.insert("shadow_stalker".to_owned(), 2);
        let total = table.total(&sets);
        let expected = table
            .bonus_for("iron_guard", 2)
            .plus(table.bonus_for("shadow_stalker", 2));
        assert_eq!(total, expected);
        assert_eq!(total.def, 10);
        assert_eq!(total.spd, 5);
        assert_eq!(total.crit, 2.0);
    }

    #[test]
    fn table_parses_with_sparse_stats() {
        let json = r#"{"moon": [{"pieces": 2, "bonus": {"crit": 3.5}}]}"#;
        let table: SetBonusTable = serde_json::from_str(json).unwrap();
        let bonus = table.bonus_for("moon", 2);
        assert_eq!(bonus.crit, 3.5);
        assert_eq!(bonus.hp, 0);
    }
}
