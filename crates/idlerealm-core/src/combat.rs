//! Combat collaborator interface and a deterministic resolver.
//!
//! Battles are resolved outside the world engine. The session hands a
//! [`CombatResolver`] the party, the enemies and the environmental context,
//! then applies the returned [`CombatOutcome`]: party HP, loot, and (on
//! victory) the object's defeated flag.

use idlerealm_player::Character;
use idlerealm_types::{ObjectId, TimeOfDay, Weather};

/// Enemy strength contributed per enemy level.
pub const STRENGTH_PER_LEVEL: u32 = 15;

/// Gold dropped per defeated enemy level.
pub const GOLD_PER_LEVEL: u32 = 10;

/// One opponent in a battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enemy {
    /// Display name.
    pub name: String,
    /// Enemy level.
    pub level: u32,
}

/// What started the battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterSource {
    /// A wandering monster on the map.
    WanderingMonster(ObjectId),
    /// A once-per-world rare spawn.
    RareSpawn(ObjectId),
    /// A dungeon run.
    Dungeon(ObjectId),
}

/// Environmental context passed along with a battle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncounterMetadata {
    /// What started the battle.
    pub source: EncounterSource,
    /// Weather at the time of the battle.
    pub weather: Weather,
    /// Time of day at the time of the battle.
    pub time_of_day: TimeOfDay,
    /// Spawn-rate multiplier in effect.
    pub spawn_multiplier: f64,
}

/// Input to a [`CombatResolver`].
#[derive(Debug, Clone)]
pub struct CombatRequest<'a> {
    /// The party, in roster order.
    pub party: &'a [Character],
    /// The opposition.
    pub enemies: Vec<Enemy>,
    /// Environmental context.
    pub metadata: EncounterMetadata,
}

/// Result of a battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatOutcome {
    /// Whether the party won.
    pub victory: bool,
    /// Each party member's HP after the battle, in roster order.
    pub party_hp: Vec<u32>,
    /// Gold looted (zero on defeat).
    pub loot_gold: u32,
}

/// A source of battle outcomes.
///
/// Implementations may be scripted, simulated, or remote; the session only
/// relies on `party_hp` lining up with the roster it sent.
pub trait CombatResolver: Send + Sync {
    /// Resolve one battle.
    fn resolve(&self, request: &CombatRequest<'_>) -> CombatOutcome;
}

/// Resolves battles by comparing party strength to enemy strength.
///
/// Party strength is the summed ATK and DEF of members still standing;
/// each enemy is worth [`STRENGTH_PER_LEVEL`] per level. Ties go to the
/// party. Damage is spread evenly over the standing members and never drops
/// anyone below 1 HP.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerCombatResolver;

impl PowerCombatResolver {
    /// Create a new resolver.
    pub const fn new() -> Self {
        Self
    }
}

impl CombatResolver for PowerCombatResolver {
    fn resolve(&self, request: &CombatRequest<'_>) -> CombatOutcome {
        let party_strength = request
            .party
            .iter()
            .filter(|c| c.current_hp() > 0)
            .fold(0_u32, |acc, c| {
                acc.saturating_add(c.stats().atk.saturating_add(c.stats().def))
            });
        let enemy_levels = request
            .enemies
            .iter()
            .fold(0_u32, |acc, e| acc.saturating_add(e.level));
        let enemy_strength = enemy_levels.saturating_mul(STRENGTH_PER_LEVEL);

        let victory = party_strength >= enemy_strength;
        let damage_taken = if victory {
            enemy_strength / 2
        } else {
            enemy_strength
        };

        let standing = u32::try_from(
            request
                .party
                .iter()
                .filter(|c| c.current_hp() > 0)
                .count(),
        )
        .unwrap_or(u32::MAX);
        let per_member = if standing == 0 {
            0
        } else {
            damage_taken.div_ceil(standing)
        };

        let party_hp = request
            .party
            .iter()
            .map(|c| match c.current_hp() {
                0 => 0,
                hp => hp.saturating_sub(per_member).max(1),
            })
            .collect();

        tracing::debug!(
            source = ?request.metadata.source,
            party_strength,
            enemy_strength,
            victory,
            "Battle resolved"
        );

        CombatOutcome {
            victory,
            party_hp,
            loot_gold: if victory {
                enemy_levels.saturating_mul(GOLD_PER_LEVEL)
            } else {
                0
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idlerealm_types::Stats;

    use super::*;

    fn fighter(atk: u32, def: u32) -> Character {
        Character::new(
            "Fighter",
            1,
            Stats {
                hp: 100,
                atk,
                def,
                spd: 10,
                crit: 5.0,
            },
        )
    }

    fn request(party: &[Character], level: u32) -> CombatRequest<'_> {
        CombatRequest {
            party,
            enemies: vec![Enemy {
                name: "Goblin".to_owned(),
                level,
            }],
            metadata: EncounterMetadata {
                source: EncounterSource::WanderingMonster(ObjectId(1)),
                weather: Weather::Clear,
                time_of_day: TimeOfDay::Day,
                spawn_multiplier: 1.0,
            },
        }
    }

    #[test]
    fn strong_party_wins_and_loots() {
        let party = vec![fighter(20, 10)];
        let outcome = PowerCombatResolver::new().resolve(&request(&party, 2));
        assert!(outcome.victory);
        assert_eq!(outcome.loot_gold, 20);
        // Strength 30 vs 30: half of 30 taken.
        assert_eq!(outcome.party_hp, vec![85]);
    }

    #[test]
    fn weak_party_loses_without_loot() {
        let party = vec![fighter(10, 5)];
        let outcome = PowerCombatResolver::new().resolve(&request(&party, 8));
        assert!(!outcome.victory);
        assert_eq!(outcome.loot_gold, 0);
        assert_eq!(outcome.party_hp, vec![1]);
    }

    #[test]
    fn damage_is_split_across_the_party() {
        let party = vec![fighter(20, 10), fighter(20, 10)];
        let outcome = PowerCombatResolver::new().resolve(&request(&party, 4));
        assert!(outcome.victory);
        assert_eq!(outcome.party_hp, vec![85, 85]);
    }
}
