//! The action facade over one player's game.
//!
//! [`GameSession`] validates every player action against the world and the
//! energy economy, then applies it to the [`WorldStateStore`] as a single
//! revision. Rejections happen before anything is mutated.
//!
//! Time-driven state is lazy: every action first brings the world up to
//! date (epoch rollover, weather and day/night, monster respawns, energy
//! regeneration) for the `now` it is given. The timer loop calls the same
//! entry points, so both paths agree.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use idlerealm_player::{EnchantOutcome, EquipOutcome, energy};
use idlerealm_types::{
    CharacterId, DiscoveredLocation, DynamicObjectKind, EquipmentSlot, Item, LocationKind,
    ObjectId, PlayerId, Position, StaticObject, StaticObjectKind,
};
use idlerealm_world::cycle::{EnemyEligibility, WeatherWeights};
use idlerealm_world::objects::{self, Consumption};
use idlerealm_world::seed::rng_for;
use idlerealm_world::{
    Discoveries, WorldError, WorldGenConfig, WorldMap, advance_time_if_due, advance_weather_if_due,
    check_path_explored, current_modifier, generate, reveal, visible_locations,
};
use tracing::{debug, info};

use crate::combat::{
    CombatOutcome, CombatRequest, CombatResolver, EncounterMetadata, EncounterSource, Enemy,
};
use crate::config::GameConfig;
use crate::epoch::epoch_for;
use crate::error::ActionError;
use crate::outcome::{DungeonRun, InteractionOutcome, MoveOutcome, WorldTick};
use crate::save::{SaveError, SaveService};
use crate::state::{GameState, PlayerState};
use crate::store::{FlushHandle, WorldStateStore};

/// One player's game: configuration, state store, and combat collaborator.
pub struct GameSession<S> {
    config: GameConfig,
    store: WorldStateStore<S>,
    combat: Box<dyn CombatResolver>,
}

impl<S: SaveService + 'static> GameSession<S> {
    /// Wrap an existing state. Must be called from within a Tokio runtime.
    pub fn new(
        config: GameConfig,
        state: GameState,
        saver: Arc<S>,
        combat: Box<dyn CombatResolver>,
    ) -> Self {
        let debounce = Duration::from_millis(config.persistence.debounce_ms);
        Self {
            store: WorldStateStore::new(state, saver, debounce),
            config,
            combat,
        }
    }

    /// Load the player's snapshot, or start a new game if none exists,
    /// then bring the world up to date for `now`.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] if the save collaborator fails or holds an
    /// undecodable snapshot.
    pub async fn load_or_create(
        config: GameConfig,
        saver: Arc<S>,
        combat: Box<dyn CombatResolver>,
        player_id: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<Self, SaveError> {
        let state = match saver.load(player_id).await? {
            Some(mut state) => {
                // Bonus tables may have changed since the snapshot was taken.
                for character in &mut state.player.characters {
                    character.recalculate_stats(&config.equipment.set_bonuses);
                }
                info!(
                    %player_id,
                    epoch = ?state.world.as_ref().map(WorldMap::epoch),
                    "Session loaded"
                );
                state
            }
            None => {
                info!(%player_id, "No saved game, starting a new one");
                GameState::new(player_id, &config, now)
            }
        };
        let mut session = Self::new(config, state, saver, combat);
        session.refresh(now);
        Ok(session)
    }
}

impl<S: SaveService> GameSession<S> {
    // -------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------

    /// The current state.
    pub fn state(&self) -> &GameState {
        self.store.state()
    }

    /// The state store.
    pub const fn store(&self) -> &WorldStateStore<S> {
        &self.store
    }

    /// The active configuration.
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The owning player.
    pub fn player_id(&self) -> PlayerId {
        self.state().player.player_id
    }

    /// Spawn-rate multiplier of the current weather (1.0 without a world).
    pub fn spawn_multiplier(&self) -> f64 {
        self.state()
            .world
            .as_ref()
            .map_or(1.0, |map| current_modifier(map.weather()))
    }

    /// Which enemy pools the current time of day allows.
    pub fn enemy_eligibility(&self) -> Option<EnemyEligibility> {
        self.state()
            .world
            .as_ref()
            .map(|map| current_modifier(map.time_of_day()))
    }

    // -------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------

    /// Snapshot for saving after the caller releases its lock.
    pub fn flush_handle(&self) -> FlushHandle<S> {
        self.store.flush_handle()
    }

    /// Persist immediately.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] if the save collaborator fails.
    pub async fn flush_now(&self) -> Result<bool, SaveError> {
        self.store.flush_now().await
    }

    // -------------------------------------------------------------------
    // Time-driven state
    // -------------------------------------------------------------------

    /// Generate the world for the epoch containing `now` if the current map
    /// is missing or stale.
    ///
    /// A new world moves the player to its capital and rebuilds the
    /// discovered list from what the initial reveal uncovered. Returns
    /// `true` if a world was generated.
    pub fn ensure_world(&mut self, now: DateTime<Utc>) -> bool {
        let epoch = epoch_for(now);
        let previous = self.state().world.as_ref().map(|w| w.epoch().to_owned());
        if previous.as_deref() == Some(epoch.as_str()) {
            return false;
        }

        let generation = WorldGenConfig {
            seed: epoch.clone(),
            ..self.config.world.clone()
        };
        let map = generate(&generation, now);
        let start = map.capital().map_or(Position::new(0, 0), |c| c.position);
        let visible = visible_locations(&map);

        self.store.update(|s| {
            s.world = Some(map);
            s.player.position = start;
            s.player.discoveries = Discoveries::new();
            s.player.discoveries.extend(visible);
        });
        info!(
            player_id = %self.player_id(),
            epoch = %epoch,
            previous = ?previous,
            start = %start,
            "World ready for epoch"
        );
        true
    }

    /// Run the world timers: epoch check, weather, day/night, respawns.
    ///
    /// Publishes a revision only if something changed.
    pub fn tick_world(&mut self, now: DateTime<Utc>) -> WorldTick {
        let regenerated = self.ensure_world(now);
        let Some(map) = self.state().world.as_ref() else {
            return WorldTick {
                regenerated,
                ..WorldTick::default()
            };
        };

        let cycles = self.config.world.cycles;
        let mut weather = *map.weather();
        let mut time_of_day = *map.time_of_day();
        let mut rng = rng_for(&format!(
            "{}:weather:{}",
            map.epoch(),
            weather.changes_at.timestamp()
        ));
        let weather_steps = advance_weather_if_due(
            &mut weather,
            now,
            &mut rng,
            &WeatherWeights::standard(),
            &cycles,
        );
        let time_steps = advance_time_if_due(&mut time_of_day, now, &cycles);
        let respawn_due = map.dynamic_objects().iter().any(|o| {
            matches!(
                &o.kind,
                DynamicObjectKind::WanderingMonster { defeated, .. }
                    if defeated.rearms_at.is_some_and(|at| now >= at)
            )
        });

        if weather_steps == 0 && time_steps == 0 && !respawn_due {
            return WorldTick {
                regenerated,
                ..WorldTick::default()
            };
        }

        let respawned = self
            .store
            .update_world_map(|m| {
                *m.weather_mut() = weather;
                *m.time_of_day_mut() = time_of_day;
                objects::rearm_due(m, now)
            })
            .unwrap_or(0);
        if weather_steps > 0 || time_steps > 0 {
            info!(
                weather = ?weather.current,
                time_of_day = ?time_of_day.current,
                weather_steps,
                time_steps,
                "Cycles advanced"
            );
        }
        WorldTick {
            regenerated,
            weather_steps,
            time_steps,
            respawned,
        }
    }

    /// Credit energy for the wall-clock time up to `now`.
    ///
    /// Returns the energy gained.
    pub fn regenerate_energy(&mut self, now: DateTime<Utc>) -> u32 {
        let current = self.state().player.energy;
        let mut energy = current;
        let gained = energy::regenerate_until(&mut energy, now);
        if energy != current {
            self.store.set_energy(energy);
        }
        if gained > 0 {
            debug!(gained, energy = energy.current, "Energy regenerated");
        }
        gained
    }

    /// Bring all time-driven state up to `now`.
    fn refresh(&mut self, now: DateTime<Utc>) {
        self.tick_world(now);
        self.regenerate_energy(now);
    }

    // -------------------------------------------------------------------
    // Travel
    // -------------------------------------------------------------------

    /// Walk to `to`: x first, then y, over explored tiles only.
    ///
    /// Costs `distance * ceil(destination cost / 100)` energy.
    ///
    /// # Errors
    ///
    /// [`ActionError::World`] for an off-grid or fogged path,
    /// [`ActionError::Player`] for insufficient energy.
    pub fn move_to(&mut self, to: Position, now: DateTime<Utc>) -> Result<MoveOutcome, ActionError> {
        self.refresh(now);
        let unlimited = self.config.debug.unlimited_energy;
        let radius = self.config.exploration.reveal_radius;
        let outcome = self.store.try_update(|s| -> Result<MoveOutcome, ActionError> {
            let map = world_mut(&mut s.world)?;
            let from = s.player.position;
            check_path_explored(map, from, to)?;
            let tile_cost = map
                .tile(to)
                .map(|t| t.movement_cost)
                .ok_or(WorldError::OutOfBounds {
                    position: to,
                    width: map.width(),
                    height: map.height(),
                })?;
            let cost = energy::movement_cost(from.manhattan(to), tile_cost);
            energy::spend(&mut s.player.energy, cost, unlimited)?;
            Ok(arrive(map, &mut s.player, from, to, radius, charged(cost, unlimited)))
        })?;
        debug!(from = %outcome.from, to = %outcome.to, cost = outcome.energy_spent, "Moved");
        Ok(outcome)
    }

    /// Fast-travel to a discovered location.
    ///
    /// # Errors
    ///
    /// [`ActionError::NotDiscovered`] if `to` is not on the discovered list,
    /// [`ActionError::Player`] for insufficient energy.
    pub fn teleport(&mut self, to: Position, now: DateTime<Utc>) -> Result<MoveOutcome, ActionError> {
        self.refresh(now);
        let unlimited = self.config.debug.unlimited_energy;
        let radius = self.config.exploration.reveal_radius;
        let cost = self.config.energy.teleport_cost;
        let outcome = self.store.try_update(|s| -> Result<MoveOutcome, ActionError> {
            let map = world_mut(&mut s.world)?;
            if !s.player.discoveries.contains(to) {
                return Err(ActionError::NotDiscovered(to));
            }
            energy::spend(&mut s.player.energy, cost, unlimited)?;
            let from = s.player.position;
            Ok(arrive(map, &mut s.player, from, to, radius, charged(cost, unlimited)))
        })?;
        debug!(from = %outcome.from, to = %outcome.to, "Teleported");
        Ok(outcome)
    }

    /// Step through the portal the player stands on to its partner.
    ///
    /// # Errors
    ///
    /// [`ActionError::NotAtLocation`] if the player is not on a portal,
    /// [`ActionError::Player`] for insufficient energy.
    pub fn use_portal(&mut self, now: DateTime<Utc>) -> Result<MoveOutcome, ActionError> {
        self.refresh(now);
        let unlimited = self.config.debug.unlimited_energy;
        let radius = self.config.exploration.reveal_radius;
        let cost = self.config.energy.portal_cost;
        let outcome = self.store.try_update(|s| -> Result<MoveOutcome, ActionError> {
            let map = world_mut(&mut s.world)?;
            let from = s.player.position;
            let portal = map
                .static_object_at(from)
                .filter(|o| matches!(o.kind, StaticObjectKind::Portal { .. }))
                .ok_or(ActionError::NotAtLocation {
                    position: from,
                    expected: LocationKind::Portal,
                })?;
            let to = map.linked_portal(portal.id)?.position;
            energy::spend(&mut s.player.energy, cost, unlimited)?;
            Ok(arrive(map, &mut s.player, from, to, radius, charged(cost, unlimited)))
        })?;
        debug!(from = %outcome.from, to = %outcome.to, "Portal used");
        Ok(outcome)
    }

    // -------------------------------------------------------------------
    // Locations and objects
    // -------------------------------------------------------------------

    /// Run the dungeon whose entrance the player stands on.
    ///
    /// Dungeons are re-enterable; each run costs the flat dungeon energy and
    /// fights a guardian of the dungeon's level.
    ///
    /// # Errors
    ///
    /// [`ActionError::NotAtLocation`] if the player is not on an entrance,
    /// [`ActionError::Player`] for insufficient energy.
    pub fn enter_dungeon(&mut self, now: DateTime<Utc>) -> Result<DungeonRun, ActionError> {
        self.refresh(now);
        let unlimited = self.config.debug.unlimited_energy;
        let cost = self.config.energy.dungeon_cost;
        let resolver = self.combat.as_ref();
        let run = self.store.try_update(|s| -> Result<DungeonRun, ActionError> {
            let map = world_mut(&mut s.world)?;
            let here = s.player.position;
            let Some(StaticObject {
                id,
                name,
                kind: StaticObjectKind::DungeonEntrance { dungeon_level },
                ..
            }) = map.static_object_at(here)
            else {
                return Err(ActionError::NotAtLocation {
                    position: here,
                    expected: LocationKind::DungeonEntrance,
                });
            };
            let (dungeon, dungeon_level) = (*id, *dungeon_level);
            let guardian = Enemy {
                name: format!("{name} Guardian"),
                level: dungeon_level,
            };
            energy::spend(&mut s.player.energy, cost, unlimited)?;
            let combat = fight(resolver, map, &s.player, guardian, EncounterSource::Dungeon(dungeon));
            apply_combat(&mut s.player, &combat);
            Ok(DungeonRun {
                dungeon,
                dungeon_level,
                energy_spent: charged(cost, unlimited),
                combat,
            })
        })?;
        info!(
            dungeon = %run.dungeon,
            level = run.dungeon_level,
            victory = run.combat.victory,
            loot = run.combat.loot_gold,
            "Dungeon run finished"
        );
        Ok(run)
    }

    /// Interact with a map object on the player's tile.
    ///
    /// Chests, hidden paths, rare spawns and events can be used once;
    /// wandering monsters come back after their respawn window. Using a
    /// spent object is not an error: it reports
    /// [`InteractionOutcome::AlreadyConsumed`] and changes nothing.
    ///
    /// # Errors
    ///
    /// [`ActionError::NotInReach`] if the object is elsewhere,
    /// [`ActionError::NotInteractive`] for towns, dungeons and portals,
    /// [`ActionError::World`] for an unknown id.
    pub fn interact(
        &mut self,
        id: ObjectId,
        now: DateTime<Utc>,
    ) -> Result<InteractionOutcome, ActionError> {
        self.refresh(now);
        let plan = {
            let state = self.state();
            let map = state.world.as_ref().ok_or(ActionError::NoWorld)?;
            plan_interaction(map, state.player.position, id)?
        };
        let radius = self.config.exploration.reveal_radius;
        let resolver = self.combat.as_ref();

        let outcome = match plan {
            Plan::Spent { available_again_at } => InteractionOutcome::AlreadyConsumed {
                available_again_at,
            },
            Plan::Merchant { stock_tier } => InteractionOutcome::Merchant { stock_tier },
            Plan::Chest => self.store.try_update(|s| -> Result<InteractionOutcome, ActionError> {
                let map = world_mut(&mut s.world)?;
                Ok(match objects::open_chest(map, id, now)? {
                    Consumption::Consumed(gold) => {
                        s.player.gold = s.player.gold.saturating_add(u64::from(gold));
                        InteractionOutcome::ChestOpened { gold }
                    }
                    Consumption::AlreadyConsumed { available_again_at } => {
                        InteractionOutcome::AlreadyConsumed { available_again_at }
                    }
                })
            })?,
            Plan::HiddenPath => self.store.try_update(|s| -> Result<InteractionOutcome, ActionError> {
                let map = world_mut(&mut s.world)?;
                Ok(match objects::discover_hidden_path(map, id, now)? {
                    Consumption::Consumed(leads_to) => {
                        let found = reveal(map, leads_to, radius).discovered;
                        InteractionOutcome::PathRevealed {
                            leads_to,
                            discovered: record(&mut s.player.discoveries, found),
                        }
                    }
                    Consumption::AlreadyConsumed { available_again_at } => {
                        InteractionOutcome::AlreadyConsumed { available_again_at }
                    }
                })
            })?,
            Plan::Event => self.store.try_update(|s| -> Result<InteractionOutcome, ActionError> {
                let map = world_mut(&mut s.world)?;
                Ok(match objects::claim_event(map, id, now)? {
                    Consumption::Consumed(gold) => {
                        s.player.gold = s.player.gold.saturating_add(u64::from(gold));
                        InteractionOutcome::EventClaimed { gold }
                    }
                    Consumption::AlreadyConsumed { available_again_at } => {
                        InteractionOutcome::AlreadyConsumed { available_again_at }
                    }
                })
            })?,
            Plan::Fight { enemy, source } => self.store.try_update(|s| -> Result<InteractionOutcome, ActionError> {
                let map = world_mut(&mut s.world)?;
                let combat = fight(resolver, map, &s.player, enemy, source);
                if combat.victory {
                    match source {
                        EncounterSource::WanderingMonster(target) => {
                            objects::defeat_monster(map, target, now)?;
                        }
                        EncounterSource::RareSpawn(target) => {
                            objects::mark_rare_spawn_defeated(map, target, now)?;
                        }
                        EncounterSource::Dungeon(_) => {}
                    }
                }
                apply_combat(&mut s.player, &combat);
                Ok(InteractionOutcome::Battle(combat))
            })?,
        };
        debug!(object = %id, outcome = ?outcome, "Interacted");
        Ok(outcome)
    }

    // -------------------------------------------------------------------
    // Equipment
    // -------------------------------------------------------------------

    /// Equip `item` on a party member.
    ///
    /// # Errors
    ///
    /// [`ActionError::CharacterNotFound`], or [`ActionError::Player`] when
    /// the item's level is too high.
    pub fn equip(
        &mut self,
        character: CharacterId,
        item: Item,
    ) -> Result<EquipOutcome, ActionError> {
        let bonuses = &self.config.equipment.set_bonuses;
        self.store.try_update(|s| {
            let member = s
                .player
                .character_mut(character)
                .ok_or(ActionError::CharacterNotFound(character))?;
            Ok(member.equip(item, bonuses)?)
        })
    }

    /// Remove the item in `slot` from a party member.
    ///
    /// # Errors
    ///
    /// [`ActionError::CharacterNotFound`], or [`ActionError::Player`] for an
    /// empty slot.
    pub fn unequip(
        &mut self,
        character: CharacterId,
        slot: EquipmentSlot,
    ) -> Result<Item, ActionError> {
        let bonuses = &self.config.equipment.set_bonuses;
        self.store.try_update(|s| {
            let member = s
                .player
                .character_mut(character)
                .ok_or(ActionError::CharacterNotFound(character))?;
            Ok(member.unequip(slot, bonuses)?)
        })
    }

    /// Enchant the item in `slot`, paying from the gold balance.
    ///
    /// # Errors
    ///
    /// [`ActionError::CharacterNotFound`], or [`ActionError::Player`] for an
    /// empty slot, the enchant cap, or insufficient gold.
    pub fn enchant(
        &mut self,
        character: CharacterId,
        slot: EquipmentSlot,
    ) -> Result<EnchantOutcome, ActionError> {
        let equipment = &self.config.equipment;
        self.store.try_update(|s| {
            let PlayerState {
                characters, gold, ..
            } = &mut s.player;
            let member = characters
                .iter_mut()
                .find(|c| c.id == character)
                .ok_or(ActionError::CharacterNotFound(character))?;
            Ok(member.enchant(slot, gold, equipment)?)
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn world_mut(world: &mut Option<WorldMap>) -> Result<&mut WorldMap, ActionError> {
    world.as_mut().ok_or(ActionError::NoWorld)
}

/// Energy actually deducted for a cost.
const fn charged(cost: u32, unlimited: bool) -> u32 {
    if unlimited { 0 } else { cost }
}

/// Append newly found locations, returning the ones that were new.
fn record(
    discoveries: &mut Discoveries,
    found: Vec<DiscoveredLocation>,
) -> Vec<DiscoveredLocation> {
    let mut added = Vec::new();
    for location in found {
        if discoveries.add(location.clone()) {
            added.push(location);
        }
    }
    added
}

/// Place the player on `to`, lift the fog around it and record discoveries.
fn arrive(
    map: &mut WorldMap,
    player: &mut PlayerState,
    from: Position,
    to: Position,
    radius: u32,
    energy_spent: u32,
) -> MoveOutcome {
    player.position = to;
    let revealed = reveal(map, to, radius);
    MoveOutcome {
        from,
        to,
        energy_spent,
        newly_explored: revealed.newly_explored,
        discovered: record(&mut player.discoveries, revealed.discovered),
    }
}

fn fight(
    resolver: &dyn CombatResolver,
    map: &WorldMap,
    player: &PlayerState,
    enemy: Enemy,
    source: EncounterSource,
) -> CombatOutcome {
    resolver.resolve(&CombatRequest {
        party: &player.characters,
        enemies: vec![enemy],
        metadata: EncounterMetadata {
            source,
            weather: map.weather().current,
            time_of_day: map.time_of_day().current,
            spawn_multiplier: current_modifier(map.weather()),
        },
    })
}

fn apply_combat(player: &mut PlayerState, outcome: &CombatOutcome) {
    for (member, hp) in player.characters.iter_mut().zip(&outcome.party_hp) {
        member.set_current_hp(*hp);
    }
    player.gold = player.gold.saturating_add(u64::from(outcome.loot_gold));
}

/// What an interaction will do, decided before anything is mutated.
enum Plan {
    Chest,
    HiddenPath,
    Event,
    Merchant { stock_tier: u32 },
    Fight { enemy: Enemy, source: EncounterSource },
    Spent { available_again_at: Option<DateTime<Utc>> },
}

impl Plan {
    const fn spent() -> Self {
        Self::Spent {
            available_again_at: None,
        }
    }
}

fn ensure_reach(id: ObjectId, object_position: Position, here: Position) -> Result<(), ActionError> {
    if object_position == here {
        return Ok(());
    }
    Err(ActionError::NotInReach {
        id,
        object_position,
        player_position: here,
    })
}

fn plan_interaction(map: &WorldMap, here: Position, id: ObjectId) -> Result<Plan, ActionError> {
    if let Some(object) = map.static_object(id) {
        ensure_reach(id, object.position, here)?;
        return match &object.kind {
            StaticObjectKind::TreasureChest { opened, .. } => Ok(if opened.is_consumed() {
                Plan::spent()
            } else {
                Plan::Chest
            }),
            StaticObjectKind::HiddenPath { discovered, .. } => Ok(if discovered.is_consumed() {
                Plan::spent()
            } else {
                Plan::HiddenPath
            }),
            StaticObjectKind::RareSpawn {
                enemy_level,
                defeated,
            } => Ok(if defeated.is_consumed() {
                Plan::spent()
            } else {
                Plan::Fight {
                    enemy: Enemy {
                        name: object.name.clone(),
                        level: *enemy_level,
                    },
                    source: EncounterSource::RareSpawn(id),
                }
            }),
            StaticObjectKind::Town { .. }
            | StaticObjectKind::DungeonEntrance { .. }
            | StaticObjectKind::Portal { .. } => Err(ActionError::NotInteractive(id)),
        };
    }

    let object = map
        .dynamic_object(id)
        .ok_or(WorldError::ObjectNotFound(id))?;
    ensure_reach(id, object.position, here)?;
    Ok(match &object.kind {
        DynamicObjectKind::WanderingMonster { level, defeated } => {
            if defeated.is_defeated() {
                Plan::Spent {
                    available_again_at: defeated.rearms_at,
                }
            } else {
                Plan::Fight {
                    enemy: Enemy {
                        name: object.name.clone(),
                        level: *level,
                    },
                    source: EncounterSource::WanderingMonster(id),
                }
            }
        }
        DynamicObjectKind::TravelingMerchant { stock_tier } => Plan::Merchant {
            stock_tier: *stock_tier,
        },
        DynamicObjectKind::Event { claimed, .. } => {
            if claimed.is_consumed() {
                Plan::spent()
            } else {
                Plan::Event
            }
        }
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use idlerealm_types::{ItemId, ItemSlot, ResourceKind, Stats, Tile};
    use idlerealm_world::CAPITAL_NAME;

    use super::*;
    use crate::combat::PowerCombatResolver;
    use crate::config::CharacterTemplate;
    use crate::save::MemorySaveService;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn config() -> GameConfig {
        GameConfig::default()
    }

    fn champion_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.player.party = vec![CharacterTemplate {
            name: "Champion".to_owned(),
            level: 10,
            base_stats: Stats {
                hp: 500,
                atk: 400,
                def: 200,
                spd: 20,
                crit: 10.0,
            },
        }];
        config
    }

    fn session_with(config: GameConfig) -> GameSession<MemorySaveService> {
        let state = GameState::new(PlayerId::new(), &config, now());
        let mut session = GameSession::new(
            config,
            state,
            Arc::new(MemorySaveService::new()),
            Box::new(PowerCombatResolver::new()),
        );
        session.ensure_world(now());
        session
    }

    fn map(session: &GameSession<MemorySaveService>) -> &WorldMap {
        session.state().world.as_ref().unwrap()
    }

    fn here(session: &GameSession<MemorySaveService>) -> Position {
        session.state().player.position
    }

    fn energy_of(session: &GameSession<MemorySaveService>) -> u32 {
        session.state().player.energy.current
    }

    fn teleport_onto(session: &mut GameSession<MemorySaveService>, position: Position) {
        session.store.update_player_pos(position);
    }

    fn static_of(session: &GameSession<MemorySaveService>, kind: LocationKind) -> StaticObject {
        map(session)
            .static_objects()
            .iter()
            .find(|o| o.kind.location_kind() == kind)
            .cloned()
            .unwrap()
    }

    /// An explored neighbour of the player's tile.
    fn explored_neighbour(session: &GameSession<MemorySaveService>) -> (Position, Tile) {
        let at = here(session);
        let map = map(session);
        [
            Position::new(at.x.saturating_add(1), at.y),
            Position::new(at.x.saturating_sub(1), at.y),
            Position::new(at.x, at.y.saturating_add(1)),
            Position::new(at.x, at.y.saturating_sub(1)),
        ]
        .into_iter()
        .filter(|p| *p != at)
        .find_map(|p| map.tile(p).filter(|t| t.is_explored).map(|t| (p, t.clone())))
        .unwrap()
    }

    fn helmet(hp: u32) -> Item {
        Item {
            id: ItemId::new(),
            name: "Iron Helm".to_owned(),
            level: 1,
            slot: ItemSlot::Helmet,
            set_id: None,
            enchant_level: 0,
            base_stats: Stats {
                hp,
                ..Stats::ZERO
            },
        }
    }

    #[tokio::test]
    async fn new_game_starts_at_the_capital() {
        let session = session_with(config());
        let capital = map(&session).capital().unwrap().clone();
        assert_eq!(capital.name, CAPITAL_NAME);
        assert_eq!(here(&session), capital.position);
        assert_eq!(map(&session).epoch(), "daily-2025-01-01");
        assert!(session.state().player.discoveries.contains(capital.position));
    }

    #[tokio::test]
    async fn move_spends_energy_by_destination_cost() {
        let mut session = session_with(config());
        let (to, tile) = explored_neighbour(&session);
        let before = energy_of(&session);

        let outcome = session.move_to(to, now()).unwrap();
        let expected = tile.movement_cost.div_ceil(100);
        assert_eq!(outcome.energy_spent, expected);
        assert_eq!(energy_of(&session), before - expected);
        assert_eq!(here(&session), to);
    }

    #[tokio::test]
    async fn move_through_fog_is_rejected_without_spending() {
        let mut session = session_with(config());
        let fogged = map(&session)
            .tiles()
            .find(|(_, t)| !t.is_explored)
            .map(|(p, _)| p)
            .unwrap();
        let start = here(&session);
        let before = energy_of(&session);
        let revision = session.store().revision();

        let err = session.move_to(fogged, now()).unwrap_err();
        assert!(matches!(
            err,
            ActionError::World {
                source: WorldError::Unexplored(_)
            }
        ));
        assert_eq!(here(&session), start);
        assert_eq!(energy_of(&session), before);
        assert_eq!(session.store().revision(), revision);
    }

    #[tokio::test]
    async fn move_off_the_grid_is_rejected() {
        let mut session = session_with(config());
        let err = session.move_to(Position::new(10_000, 0), now()).unwrap_err();
        assert!(matches!(
            err,
            ActionError::World {
                source: WorldError::OutOfBounds { .. }
            }
        ));
    }

    #[tokio::test]
    async fn insufficient_energy_blocks_the_move() {
        let mut session = session_with(config());
        let mut drained = session.state().player.energy;
        drained.current = 0;
        drained.last_evaluated_at = now();
        session.store.set_energy(drained);
        let (to, _) = explored_neighbour(&session);
        let start = here(&session);

        let err = session.move_to(to, now()).unwrap_err();
        assert_eq!(err.insufficient_resource(), Some(ResourceKind::Energy));
        assert!(matches!(
            err,
            ActionError::Player {
                source: idlerealm_player::PlayerError::InsufficientEnergy {
                    available: 0,
                    ..
                }
            }
        ));
        assert_eq!(here(&session), start);
    }

    #[tokio::test]
    async fn unlimited_energy_skips_checks_without_touching_energy() {
        let mut config = config();
        config.debug.unlimited_energy = true;
        let mut session = session_with(config);
        let mut drained = session.state().player.energy;
        drained.current = 0;
        drained.last_evaluated_at = now();
        session.store.set_energy(drained);
        let (to, _) = explored_neighbour(&session);

        let outcome = session.move_to(to, now()).unwrap();
        assert_eq!(outcome.energy_spent, 0);
        assert_eq!(energy_of(&session), 0);

        let capital = map(&session).capital().unwrap().position;
        session.teleport(capital, now()).unwrap();
        assert_eq!(energy_of(&session), 0);
    }

    #[tokio::test]
    async fn energy_regenerates_before_acting() {
        let mut session = session_with(config());
        let mut drained = session.state().player.energy;
        drained.current = 0;
        drained.last_evaluated_at = now();
        session.store.set_energy(drained);

        let later = now() + ChronoDuration::minutes(90);
        assert_eq!(session.regenerate_energy(later), 15);
        assert_eq!(energy_of(&session), 15);
    }

    #[tokio::test]
    async fn teleport_requires_a_discovered_location() {
        let mut session = session_with(config());
        let undiscovered = map(&session)
            .tiles()
            .map(|(p, _)| p)
            .find(|p| !session.state().player.discoveries.contains(*p))
            .unwrap();
        let err = session.teleport(undiscovered, now()).unwrap_err();
        assert!(matches!(err, ActionError::NotDiscovered(p) if p == undiscovered));

        let (to, _) = explored_neighbour(&session);
        session.move_to(to, now()).unwrap();
        let before = energy_of(&session);
        let capital = map(&session).capital().unwrap().position;
        let outcome = session.teleport(capital, now()).unwrap();
        assert_eq!(outcome.energy_spent, 5);
        assert_eq!(energy_of(&session), before - 5);
        assert_eq!(here(&session), capital);
    }

    #[tokio::test]
    async fn portal_moves_to_the_linked_end() {
        let mut session = session_with(config());
        let portal = static_of(&session, LocationKind::Portal);
        let partner = map(&session).linked_portal(portal.id).unwrap().clone();
        teleport_onto(&mut session, portal.position);
        let before = energy_of(&session);

        let outcome = session.use_portal(now()).unwrap();
        assert_eq!(outcome.to, partner.position);
        assert_eq!(energy_of(&session), before - 3);
        assert!(map(&session).is_explored(partner.position));
        assert!(session.state().player.discoveries.contains(partner.position));
    }

    #[tokio::test]
    async fn portal_requires_standing_on_one() {
        let mut session = session_with(config());
        let err = session.use_portal(now()).unwrap_err();
        assert!(matches!(
            err,
            ActionError::NotAtLocation {
                expected: LocationKind::Portal,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn dungeon_run_costs_flat_energy() {
        let mut session = session_with(champion_config());
        let dungeon = static_of(&session, LocationKind::DungeonEntrance);
        teleport_onto(&mut session, dungeon.position);
        let gold = session.state().player.gold;

        let run = session.enter_dungeon(now()).unwrap();
        assert_eq!(run.dungeon, dungeon.id);
        assert_eq!(run.energy_spent, 10);
        assert_eq!(energy_of(&session), 90);
        assert!(run.combat.victory);
        assert_eq!(
            session.state().player.gold,
            gold + u64::from(run.combat.loot_gold)
        );

        // Dungeons can be run again.
        assert!(session.enter_dungeon(now()).is_ok());
    }

    #[tokio::test]
    async fn chest_opens_once() {
        let mut session = session_with(config());
        let chest = static_of(&session, LocationKind::TreasureChest);
        teleport_onto(&mut session, chest.position);
        let gold = session.state().player.gold;

        let InteractionOutcome::ChestOpened { gold: found } =
            session.interact(chest.id, now()).unwrap()
        else {
            panic!("expected an opened chest");
        };
        assert_eq!(session.state().player.gold, gold + u64::from(found));

        let revision = session.store().revision();
        assert_eq!(
            session.interact(chest.id, now()).unwrap(),
            InteractionOutcome::AlreadyConsumed {
                available_again_at: None
            }
        );
        assert_eq!(session.store().revision(), revision);
    }

    #[tokio::test]
    async fn interaction_needs_the_object_in_reach() {
        let mut session = session_with(config());
        let chest = static_of(&session, LocationKind::TreasureChest);
        let err = session.interact(chest.id, now()).unwrap_err();
        assert!(matches!(err, ActionError::NotInReach { .. }));
    }

    #[tokio::test]
    async fn towns_are_not_interactive() {
        let mut session = session_with(config());
        let capital = map(&session).capital().unwrap().id;
        let err = session.interact(capital, now()).unwrap_err();
        assert!(matches!(err, ActionError::NotInteractive(id) if id == capital));
    }

    #[tokio::test]
    async fn hidden_path_reveals_its_destination() {
        let mut session = session_with(config());
        let path = static_of(&session, LocationKind::HiddenPath);
        let StaticObjectKind::HiddenPath { leads_to, .. } = path.kind else {
            panic!("expected a hidden path");
        };
        teleport_onto(&mut session, path.position);

        let outcome = session.interact(path.id, now()).unwrap();
        assert!(matches!(
            outcome,
            InteractionOutcome::PathRevealed { leads_to: to, .. } if to == leads_to
        ));
        assert!(map(&session).is_explored(leads_to));
        assert!(matches!(
            session.interact(path.id, now()).unwrap(),
            InteractionOutcome::AlreadyConsumed { .. }
        ));
    }

    #[tokio::test]
    async fn monster_respawns_after_its_window() {
        let mut session = session_with(champion_config());
        let monster = map(&session)
            .dynamic_objects()
            .iter()
            .find(|o| matches!(o.kind, DynamicObjectKind::WanderingMonster { .. }))
            .cloned()
            .unwrap();
        teleport_onto(&mut session, monster.position);

        let first = session.interact(monster.id, now()).unwrap();
        assert!(matches!(first, InteractionOutcome::Battle(ref c) if c.victory));
        assert!(!map(&session).dynamic_object(monster.id).unwrap().is_active);

        let InteractionOutcome::AlreadyConsumed {
            available_again_at: Some(back_at),
        } = session.interact(monster.id, now()).unwrap()
        else {
            panic!("expected the monster to be down");
        };
        assert_eq!(back_at, now() + ChronoDuration::minutes(30));

        let tick = session.tick_world(back_at);
        assert_eq!(tick.respawned, 1);
        assert!(map(&session).dynamic_object(monster.id).unwrap().is_active);
        assert!(matches!(
            session.interact(monster.id, back_at).unwrap(),
            InteractionOutcome::Battle(_)
        ));
    }

    #[tokio::test]
    async fn lost_battle_leaves_the_rare_spawn_standing() {
        let mut session = session_with(config());
        let rare = static_of(&session, LocationKind::RareSpawn);
        teleport_onto(&mut session, rare.position);

        let outcome = session.interact(rare.id, now()).unwrap();
        assert!(matches!(outcome, InteractionOutcome::Battle(ref c) if !c.victory));
        assert!(!objects::is_consumed(map(&session), rare.id).unwrap());
        assert!(session.state().player.characters[0].current_hp() < 100);
        assert_eq!(session.state().player.gold, 500);
    }

    #[tokio::test]
    async fn event_reward_is_claimed_once() {
        let mut session = session_with(config());
        let event = map(&session)
            .dynamic_objects()
            .iter()
            .find(|o| matches!(o.kind, DynamicObjectKind::Event { .. }))
            .cloned()
            .unwrap();
        teleport_onto(&mut session, event.position);
        assert!(matches!(
            session.interact(event.id, now()).unwrap(),
            InteractionOutcome::EventClaimed { .. }
        ));
        assert!(matches!(
            session.interact(event.id, now()).unwrap(),
            InteractionOutcome::AlreadyConsumed { .. }
        ));
    }

    #[tokio::test]
    async fn epoch_rollover_regenerates_the_world() {
        let mut session = session_with(config());
        let (to, _) = explored_neighbour(&session);
        session.move_to(to, now()).unwrap();

        let tomorrow = now() + ChronoDuration::days(1);
        let tick = session.tick_world(tomorrow);
        assert!(tick.regenerated);
        assert_eq!(map(&session).epoch(), "daily-2025-01-02");
        let capital = map(&session).capital().unwrap().position;
        assert_eq!(here(&session), capital);
        let expected = visible_locations(map(&session));
        assert_eq!(session.state().player.discoveries.as_slice(), expected.as_slice());

        assert!(!session.tick_world(tomorrow).regenerated);
    }

    #[tokio::test]
    async fn cycles_advance_on_tick() {
        let mut session = session_with(config());
        let time = *map(&session).time_of_day();
        let tick = session.tick_world(time.changes_at);
        assert_eq!(tick.time_steps, 1);
        assert_eq!(map(&session).time_of_day().current, time.next);

        let weather = *map(&session).weather();
        let tick = session.tick_world(weather.changes_at);
        assert_eq!(tick.weather_steps, 1);
        assert_eq!(map(&session).weather().current, weather.next);
        assert_ne!(map(&session).weather().current, map(&session).weather().next);
        assert!(map(&session).weather().changes_at > weather.changes_at);
        assert_eq!(
            session.spawn_multiplier(),
            current_modifier(map(&session).weather())
        );
    }

    #[tokio::test]
    async fn equip_and_unequip_recompute_stats() {
        let mut session = session_with(config());
        let hero = session.state().player.characters[0].id;

        let outcome = session.equip(hero, helmet(20)).unwrap();
        assert_eq!(outcome.slot, EquipmentSlot::Helmet);
        assert_eq!(session.state().player.characters[0].stats().hp, 120);

        session.unequip(hero, EquipmentSlot::Helmet).unwrap();
        let member = &session.state().player.characters[0];
        assert_eq!(member.stats().hp, 100);
        assert!(member.current_hp() <= 100);
    }

    #[tokio::test]
    async fn unknown_character_is_rejected() {
        let mut session = session_with(config());
        let stranger = CharacterId::new();
        let err = session.equip(stranger, helmet(5)).unwrap_err();
        assert!(matches!(err, ActionError::CharacterNotFound(id) if id == stranger));
    }

    #[tokio::test]
    async fn enchant_is_gated_on_gold() {
        let mut session = session_with(config());
        let hero = session.state().player.characters[0].id;
        session.equip(hero, helmet(20)).unwrap();

        let outcome = session.enchant(hero, EquipmentSlot::Helmet).unwrap();
        assert_eq!(outcome.gold_spent, 100);
        assert_eq!(session.state().player.gold, 400);

        session.store.set_gold(50);
        let err = session.enchant(hero, EquipmentSlot::Helmet).unwrap_err();
        assert_eq!(err.insufficient_resource(), Some(ResourceKind::Gold));
        assert_eq!(session.state().player.gold, 50);
    }

    #[tokio::test]
    async fn load_or_create_restores_a_saved_game() {
        let saver = Arc::new(MemorySaveService::new());
        let player_id = PlayerId::new();
        let first = GameSession::load_or_create(
            config(),
            Arc::clone(&saver),
            Box::new(PowerCombatResolver::new()),
            player_id,
            now(),
        )
        .await
        .unwrap();
        assert!(first.store().is_dirty());
        assert!(first.flush_now().await.unwrap());
        let saved = first.state().clone();

        let second = GameSession::load_or_create(
            config(),
            saver,
            Box::new(PowerCombatResolver::new()),
            player_id,
            now(),
        )
        .await
        .unwrap();
        assert_eq!(second.state(), &saved);
        assert!(!second.store().is_dirty());
    }
}
