//! The composed game state snapshot.
//!
//! [`GameState`] is the unit of persistence: one JSON document per player
//! holding the current world map and every piece of player progression.

use chrono::{DateTime, Utc};
use idlerealm_player::{Character, energy};
use idlerealm_types::{CharacterId, EnergyState, PlayerId, Position};
use idlerealm_world::{Discoveries, WorldMap};
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;

/// Player progression that survives epoch rollover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Owner of this state.
    pub player_id: PlayerId,
    /// Current tile on the world map.
    pub position: Position,
    /// Action energy.
    pub energy: EnergyState,
    /// Locations uncovered on the current map (the teleport list).
    #[serde(default)]
    pub discoveries: Discoveries,
    /// The party.
    pub characters: Vec<Character>,
    /// Gold.
    #[serde(default)]
    pub gold: u64,
}

impl PlayerState {
    /// Look up a party member.
    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Look up a party member mutably.
    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.id == id)
    }
}

/// Everything persisted for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Player progression.
    pub player: PlayerState,
    /// The current epoch's world. `None` until first generated.
    #[serde(default)]
    pub world: Option<WorldMap>,
}

impl GameState {
    /// A brand-new player with the configured party, full energy and no
    /// world yet.
    pub fn new(player_id: PlayerId, config: &GameConfig, now: DateTime<Utc>) -> Self {
        let characters = config
            .player
            .party
            .iter()
            .map(|t| Character::new(t.name.clone(), t.level, t.base_stats))
            .collect();
        Self {
            player: PlayerState {
                player_id,
                position: Position::new(0, 0),
                energy: energy::full(&config.energy, now),
                discoveries: Discoveries::new(),
                characters,
                gold: config.player.starting_gold,
            },
            world: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idlerealm_world::{WorldGenConfig, generate};

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn new_state_uses_config() {
        let config = GameConfig::default();
        let state = GameState::new(PlayerId::new(), &config, now());
        assert_eq!(state.player.energy.current, 100);
        assert_eq!(state.player.gold, 500);
        assert_eq!(state.player.characters.len(), 1);
        assert!(state.world.is_none());
    }

    #[test]
    fn snapshot_roundtrips_through_json() {
        let config = GameConfig::default();
        let mut state = GameState::new(PlayerId::new(), &config, now());
        state.world = Some(generate(
            &WorldGenConfig {
                width: 12,
                height: 12,
                seed: "daily-2025-01-01".to_owned(),
                ..WorldGenConfig::default()
            },
            now(),
        ));
        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn snapshot_accepts_transport_rewritten_timestamps() {
        let config = GameConfig::default();
        let state = GameState::new(PlayerId::new(), &config, now());
        let mut value = serde_json::to_value(&state).unwrap();
        value["player"]["energy"]["last_evaluated_at"] =
            serde_json::json!({ "_seconds": now().timestamp(), "_nanoseconds": 0 });
        let back: GameState = serde_json::from_value(value).unwrap();
        assert_eq!(back.player.energy.last_evaluated_at, now());
    }
}
