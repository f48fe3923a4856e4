//! Configuration loading and typed config structures for Idlerealm.
//!
//! The canonical configuration lives in `idlerealm-config.yaml` at the
//! project root. Every section and every field has a default, so an empty
//! (or missing) file yields a playable game.
//!
//! Environment variables override the file:
//! - `DRAGONFLY_URL` overrides `persistence.dragonfly_url`
//! - `IDLEREALM_PLAYER_ID` overrides `player.player_id`

use std::path::Path;

use idlerealm_player::{EnergyConfig, EquipmentConfig};
use idlerealm_types::{PlayerId, Stats};
use idlerealm_world::WorldGenConfig;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override holds an unusable value.
    #[error("invalid value in environment variable {name}: {reason}")]
    InvalidEnv {
        /// The variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration, mirroring `idlerealm-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameConfig {
    /// World generation (the seed is replaced by the daily epoch) and
    /// cycle periods under `world.cycles`.
    #[serde(default)]
    pub world: WorldGenConfig,

    /// Exploration parameters.
    #[serde(default)]
    pub exploration: ExplorationConfig,

    /// Energy economy.
    #[serde(default)]
    pub energy: EnergyConfig,

    /// Equipment engine and set bonuses.
    #[serde(default)]
    pub equipment: EquipmentConfig,

    /// Player bootstrap: identity, starting gold and party.
    #[serde(default)]
    pub player: PlayerConfig,

    /// Save store connection and flush debounce.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Periodic background checks.
    #[serde(default)]
    pub timers: TimerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Debug overrides.
    #[serde(default)]
    pub debug: DebugConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidEnv`] if an override cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    ///
    /// Environment overrides apply either way.
    ///
    /// # Errors
    ///
    /// As [`from_file`](Self::from_file).
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::InvalidEnv`] if an override cannot be parsed.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty mapping.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `IDLEREALM_PLAYER_ID` is not a
    /// UUID.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("DRAGONFLY_URL") {
            self.persistence.dragonfly_url = val;
        }
        if let Ok(val) = std::env::var("IDLEREALM_PLAYER_ID") {
            let id = uuid::Uuid::parse_str(val.trim()).map_err(|e| ConfigError::InvalidEnv {
                name: "IDLEREALM_PLAYER_ID",
                reason: e.to_string(),
            })?;
            self.player.player_id = Some(PlayerId::from(id));
        }
        Ok(())
    }
}

/// Exploration configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExplorationConfig {
    /// Radius revealed around the player after every move (default: 2).
    #[serde(default = "default_reveal_radius")]
    pub reveal_radius: u32,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            reveal_radius: default_reveal_radius(),
        }
    }
}

/// A starting party member.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CharacterTemplate {
    /// Display name.
    pub name: String,
    /// Starting level.
    #[serde(default = "default_character_level")]
    pub level: u32,
    /// Base stats.
    #[serde(default = "default_base_stats")]
    pub base_stats: Stats,
}

/// Player bootstrap configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerConfig {
    /// Fixed player id. A fresh one is minted when unset.
    #[serde(default)]
    pub player_id: Option<PlayerId>,

    /// Gold a new player starts with (default: 500).
    #[serde(default = "default_starting_gold")]
    pub starting_gold: u64,

    /// The starting party (default: a single level-1 hero).
    #[serde(default = "default_party")]
    pub party: Vec<CharacterTemplate>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            player_id: None,
            starting_gold: default_starting_gold(),
            party: default_party(),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Dragonfly (Redis-compatible) URL.
    #[serde(default = "default_dragonfly_url")]
    pub dragonfly_url: String,

    /// Delay between the first unsaved mutation and the save (default: 1500).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            dragonfly_url: default_dragonfly_url(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Background timer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimerConfig {
    /// Seconds between weather / time-of-day / respawn checks (default: 60).
    #[serde(default = "default_cycle_check_secs")]
    pub cycle_check_secs: u64,

    /// Seconds between energy regeneration checks (default: 60).
    #[serde(default = "default_regen_check_secs")]
    pub regen_check_secs: u64,

    /// Seconds between presence heartbeats (default: 15).
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            cycle_check_secs: default_cycle_check_secs(),
            regen_check_secs: default_regen_check_secs(),
            heartbeat_secs: default_heartbeat_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn,
    /// error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Debug overrides. Never enable in production.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DebugConfig {
    /// Skip every energy sufficiency check without touching stored energy.
    #[serde(default)]
    pub unlimited_energy: bool,
}

const fn default_reveal_radius() -> u32 {
    2
}

const fn default_character_level() -> u32 {
    1
}

const fn default_base_stats() -> Stats {
    Stats {
        hp: 100,
        atk: 10,
        def: 5,
        spd: 10,
        crit: 5.0,
    }
}

const fn default_starting_gold() -> u64 {
    500
}

fn default_party() -> Vec<CharacterTemplate> {
    vec![CharacterTemplate {
        name: "Hero".to_owned(),
        level: default_character_level(),
        base_stats: default_base_stats(),
    }]
}

fn default_dragonfly_url() -> String {
    "redis://localhost:6379".to_owned()
}

const fn default_debounce_ms() -> u64 {
    1500
}

const fn default_cycle_check_secs() -> u64 {
    60
}

const fn default_regen_check_secs() -> u64 {
    60
}

const fn default_heartbeat_secs() -> u64 {
    15
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GameConfig::default();
        assert_eq!(config.world.width, 50);
        assert_eq!(config.energy.max_energy, 100);
        assert_eq!(config.persistence.debounce_ms, 1500);
        assert_eq!(config.timers.heartbeat_secs, 15);
        assert_eq!(config.player.party.len(), 1);
        assert!(!config.debug.unlimited_energy);
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
world:
  width: 30
  height: 20
  town_count: 3
  cycles:
    weather_period_minutes: 45

energy:
  max_energy: 150
  teleport_cost: 8

equipment:
  enchant_base_cost: 50
  set_bonuses:
    moonlit:
      - pieces: 2
        bonus:
          crit: 4.0

player:
  starting_gold: 1000
  party:
    - name: Ayla
      level: 3
    - name: Brom
      base_stats:
        hp: 180
        def: 20

persistence:
  debounce_ms: 500

debug:
  unlimited_energy: true
";
        let config = GameConfig::parse(yaml).unwrap();
        assert_eq!(config.world.width, 30);
        assert_eq!(config.world.height, 20);
        assert_eq!(config.world.dungeon_count, 5);
        assert_eq!(config.world.cycles.weather_period_minutes, 45);
        assert_eq!(config.energy.max_energy, 150);
        assert_eq!(config.energy.teleport_cost, 8);
        assert_eq!(config.energy.portal_cost, 3);
        assert_eq!(config.equipment.enchant_base_cost, 50);
        assert_eq!(config.equipment.set_bonuses.bonus_for("moonlit", 2).crit, 4.0);
        assert_eq!(config.player.starting_gold, 1000);
        let party = &config.player.party;
        assert_eq!(party.len(), 2);
        assert_eq!(party.first().unwrap().level, 3);
        assert_eq!(party.first().unwrap().base_stats.hp, 100);
        assert_eq!(party.get(1).unwrap().level, 1);
        assert_eq!(party.get(1).unwrap().base_stats.hp, 180);
        assert_eq!(party.get(1).unwrap().base_stats.atk, 0);
        assert_eq!(config.persistence.debounce_ms, 500);
        assert!(config.debug.unlimited_energy);
        assert_eq!(config.timers.cycle_check_secs, 60);
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = GameConfig::parse("").unwrap();
        assert_eq!(config.exploration.reveal_radius, 2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let shipped = GameConfig::parse(include_str!("../../../idlerealm-config.yaml")).unwrap();
        assert_eq!(shipped.world, GameConfig::default().world);
        assert_eq!(shipped.energy, GameConfig::default().energy);
        assert_eq!(shipped.timers, GameConfig::default().timers);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(matches!(
            GameConfig::parse("world: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
