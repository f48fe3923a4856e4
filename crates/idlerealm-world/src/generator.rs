//! Deterministic world generation.
//!
//! [`generate`] turns a [`WorldGenConfig`] into a fresh [`WorldMap`]. All
//! randomness comes from one [`StdRng`] seeded from the config's seed
//! string, consumed in a fixed order:
//!
//! 1. Terrain: one weighted draw per tile, row by row, followed by a single
//!    majority-smoothing pass (no randomness).
//! 2. Object placement, category by category: towns, dungeon entrances,
//!    portal pairs, hidden paths, treasure chests, rare spawns, wandering
//!    monsters, traveling merchants, events.
//! 3. Initial weather.
//!
//! The same config therefore yields the same grid and the same objects.
//!
//! # Placement
//!
//! Each object is placed by rejection sampling: a random tile is accepted if
//! it is free, dry (unless no dry tile is left), and at least
//! `min_separation` tiles (Chebyshev) from every object already placed.
//! After `max_placement_attempts` rejections the separation shrinks by one
//! and sampling repeats. At separation zero a final row-major scan takes the
//! first free tile. Only when the grid is completely full is an object
//! skipped. Generation never fails.

use chrono::{DateTime, Utc};
use idlerealm_types::{
    DynamicObject, DynamicObjectKind, ObjectId, OneShot, Position, Rearming, StaticObject,
    StaticObjectKind, Terrain, Tile,
};
use rand::Rng;
use rand::rngs::StdRng;
use serde::Deserialize;

use crate::cycle::{CycleConfig, WeatherWeights, initial_time_of_day, initial_weather};
use crate::fog;
use crate::seed::rng_for;
use crate::world_map::WorldMap;

/// Generation parameters.
///
/// Every field has a default, so a partial YAML section is enough.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldGenConfig {
    /// Grid width in tiles (at least 1).
    #[serde(default = "default_dimension")]
    pub width: u32,

    /// Grid height in tiles (at least 1).
    #[serde(default = "default_dimension")]
    pub height: u32,

    /// Seed string. The session overrides this with the daily epoch.
    #[serde(default = "default_seed")]
    pub seed: String,

    /// Towns to place. At least one is always placed to host the capital.
    #[serde(default = "default_town_count")]
    pub town_count: u32,

    /// Dungeon entrances to place.
    #[serde(default = "default_dungeon_count")]
    pub dungeon_count: u32,

    /// Wandering monsters to place.
    #[serde(default = "default_encounter_count")]
    pub encounter_count: u32,

    /// Treasure chests to place.
    #[serde(default = "default_resource_count")]
    pub resource_count: u32,

    /// Linked portal pairs to place.
    #[serde(default = "default_portal_pairs")]
    pub portal_pairs: u32,

    /// Hidden paths to place.
    #[serde(default = "default_hidden_path_count")]
    pub hidden_path_count: u32,

    /// Rare spawns to place.
    #[serde(default = "default_rare_spawn_count")]
    pub rare_spawn_count: u32,

    /// Traveling merchants to place.
    #[serde(default = "default_merchant_count")]
    pub merchant_count: u32,

    /// World events to place.
    #[serde(default = "default_event_count")]
    pub event_count: u32,

    /// Preferred minimum Chebyshev distance between objects.
    #[serde(default = "default_min_separation")]
    pub min_separation: u32,

    /// Rejected draws tolerated before the separation is relaxed.
    #[serde(default = "default_max_placement_attempts")]
    pub max_placement_attempts: u32,

    /// Radius revealed around the capital.
    #[serde(default = "default_initial_reveal_radius")]
    pub initial_reveal_radius: u32,

    /// Minutes before a defeated wandering monster returns.
    #[serde(default = "default_monster_respawn_minutes")]
    pub monster_respawn_minutes: u32,

    /// Weather and day/night periods.
    #[serde(default)]
    pub cycles: CycleConfig,
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            width: default_dimension(),
            height: default_dimension(),
            seed: default_seed(),
            town_count: default_town_count(),
            dungeon_count: default_dungeon_count(),
            encounter_count: default_encounter_count(),
            resource_count: default_resource_count(),
            portal_pairs: default_portal_pairs(),
            hidden_path_count: default_hidden_path_count(),
            rare_spawn_count: default_rare_spawn_count(),
            merchant_count: default_merchant_count(),
            event_count: default_event_count(),
            min_separation: default_min_separation(),
            max_placement_attempts: default_max_placement_attempts(),
            initial_reveal_radius: default_initial_reveal_radius(),
            monster_respawn_minutes: default_monster_respawn_minutes(),
            cycles: CycleConfig::default(),
        }
    }
}

const fn default_dimension() -> u32 {
    50
}

fn default_seed() -> String {
    "daily-1970-01-01".to_owned()
}

const fn default_town_count() -> u32 {
    4
}

const fn default_dungeon_count() -> u32 {
    5
}

const fn default_encounter_count() -> u32 {
    8
}

const fn default_resource_count() -> u32 {
    6
}

const fn default_portal_pairs() -> u32 {
    2
}

const fn default_hidden_path_count() -> u32 {
    3
}

const fn default_rare_spawn_count() -> u32 {
    2
}

const fn default_merchant_count() -> u32 {
    1
}

const fn default_event_count() -> u32 {
    1
}

const fn default_min_separation() -> u32 {
    4
}

const fn default_max_placement_attempts() -> u32 {
    64
}

const fn default_initial_reveal_radius() -> u32 {
    5
}

const fn default_monster_respawn_minutes() -> u32 {
    30
}

/// Name given to the designated starting town.
pub const CAPITAL_NAME: &str = "Capital";

/// Movement cost of a terrain, in hundredths of an energy point per step.
pub const fn movement_cost(terrain: Terrain) -> u32 {
    match terrain {
        Terrain::Plains => 100,
        Terrain::Forest | Terrain::Desert => 150,
        Terrain::Hills => 200,
        Terrain::Swamp => 250,
        Terrain::Mountain => 300,
        Terrain::Water => 400,
    }
}

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// Weighted terrain table, same shape as [`WeatherWeights`].
#[derive(Debug, Clone)]
struct TerrainWeights {
    entries: Vec<(Terrain, u32)>,
}

impl TerrainWeights {
    fn standard() -> Self {
        Self {
            entries: vec![
                (Terrain::Plains, 40),
                (Terrain::Forest, 20),
                (Terrain::Hills, 12),
                (Terrain::Mountain, 8),
                (Terrain::Desert, 8),
                (Terrain::Swamp, 6),
                (Terrain::Water, 6),
            ],
        }
    }

    fn total_weight(&self) -> u32 {
        self.entries
            .iter()
            .fold(0_u32, |total, &(_, weight)| total.saturating_add(weight))
    }

    fn select(&self, roll: u32) -> Terrain {
        let mut cumulative: u32 = 0;
        for &(terrain, weight) in &self.entries {
            cumulative = cumulative.saturating_add(weight);
            if roll < cumulative {
                return terrain;
            }
        }
        Terrain::Plains
    }

    fn draw(&self, rng: &mut StdRng) -> Terrain {
        let total = self.total_weight().max(1);
        self.select(rng.random_range(0..total))
    }
}

/// Tiles of a 3x3 window that must agree before the centre is overwritten.
const SMOOTHING_MAJORITY: usize = 5;

/// Row-major terrain grid.
struct TerrainGrid {
    width: u32,
    height: u32,
    cells: Vec<Terrain>,
}

impl TerrainGrid {
    fn random(width: u32, height: u32, rng: &mut StdRng) -> Self {
        let weights = TerrainWeights::standard();
        let count = usize::try_from(u64::from(width).saturating_mul(u64::from(height)))
            .unwrap_or(0);
        let cells = (0..count).map(|_| weights.draw(rng)).collect();
        Self {
            width,
            height,
            cells,
        }
    }

    fn index(&self, position: Position) -> Option<usize> {
        if position.x >= self.width || position.y >= self.height {
            return None;
        }
        let row = usize::try_from(position.y).ok()?;
        let col = usize::try_from(position.x).ok()?;
        row.checked_mul(usize::try_from(self.width).ok()?)?
            .checked_add(col)
    }

    fn get(&self, position: Position) -> Option<Terrain> {
        self.index(position).and_then(|i| self.cells.get(i)).copied()
    }

    /// Replace each tile with the majority terrain of its 3x3 window, when
    /// one terrain holds at least [`SMOOTHING_MAJORITY`] of the cells.
    fn smooth(&mut self) {
        let mut smoothed = self.cells.clone();
        for y in 0..self.height {
            for x in 0..self.width {
                let center = Position::new(x, y);
                let mut counts: Vec<(Terrain, usize)> = Vec::with_capacity(9);
                for ny in y.saturating_sub(1)..=y.saturating_add(1) {
                    for nx in x.saturating_sub(1)..=x.saturating_add(1) {
                        let Some(terrain) = self.get(Position::new(nx, ny)) else {
                            continue;
                        };
                        match counts.iter_mut().find(|(t, _)| *t == terrain) {
                            Some((_, n)) => *n = n.saturating_add(1),
                            None => counts.push((terrain, 1)),
                        }
                    }
                }
                if let Some(&(majority, _)) =
                    counts.iter().find(|&&(_, n)| n >= SMOOTHING_MAJORITY)
                    && let Some(slot) = self.index(center).and_then(|i| smoothed.get_mut(i))
                {
                    *slot = majority;
                }
            }
        }
        self.cells = smoothed;
    }

    fn into_tiles(self) -> Vec<Tile> {
        self.cells
            .into_iter()
            .map(|terrain| Tile {
                terrain,
                movement_cost: movement_cost(terrain),
                is_explored: false,
                static_object: None,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// Tracks occupied tiles and places objects with relaxing separation.
struct Placer<'g> {
    grid: &'g TerrainGrid,
    occupied: Vec<bool>,
    placed: Vec<Position>,
    free_dry: usize,
    free_total: usize,
    min_separation: u32,
    max_attempts: u32,
}

impl<'g> Placer<'g> {
    fn new(grid: &'g TerrainGrid, min_separation: u32, max_attempts: u32) -> Self {
        let free_total = grid.cells.len();
        let free_dry = grid.cells.iter().filter(|&&t| t != Terrain::Water).count();
        Self {
            grid,
            occupied: vec![false; free_total],
            placed: Vec::new(),
            free_dry,
            free_total,
            min_separation,
            max_attempts,
        }
    }

    fn is_free(&self, position: Position) -> bool {
        self.grid
            .index(position)
            .and_then(|i| self.occupied.get(i))
            .is_some_and(|occupied| !occupied)
    }

    fn is_water(&self, position: Position) -> bool {
        self.grid.get(position) == Some(Terrain::Water)
    }

    fn acceptable(&self, position: Position, separation: u32, avoid_water: bool) -> bool {
        self.is_free(position)
            && !(avoid_water && self.is_water(position))
            && self
                .placed
                .iter()
                .all(|&other| other.chebyshev(position) >= separation)
    }

    fn claim(&mut self, position: Position) {
        let water = self.is_water(position);
        if let Some(slot) = self.grid.index(position).and_then(|i| self.occupied.get_mut(i)) {
            *slot = true;
        }
        self.placed.push(position);
        self.free_total = self.free_total.saturating_sub(1);
        if !water {
            self.free_dry = self.free_dry.saturating_sub(1);
        }
    }

    fn release(&mut self, position: Position) {
        let water = self.is_water(position);
        if let Some(slot) = self.grid.index(position).and_then(|i| self.occupied.get_mut(i)) {
            *slot = false;
        }
        self.placed.retain(|&p| p != position);
        self.free_total = self.free_total.saturating_add(1);
        if !water {
            self.free_dry = self.free_dry.saturating_add(1);
        }
    }

    fn random_position(&self, rng: &mut StdRng) -> Position {
        Position::new(
            rng.random_range(0..self.grid.width),
            rng.random_range(0..self.grid.height),
        )
    }

    /// Place one object, or `None` when the grid is full.
    fn place(&mut self, rng: &mut StdRng, category: &'static str) -> Option<Position> {
        if self.free_total == 0 {
            return None;
        }
        let avoid_water = self.free_dry > 0;
        let mut separation = self.min_separation;
        loop {
            for _ in 0..self.max_attempts {
                let candidate = self.random_position(rng);
                if self.acceptable(candidate, separation, avoid_water) {
                    if separation < self.min_separation {
                        tracing::warn!(
                            category,
                            position = %candidate,
                            separation,
                            min_separation = self.min_separation,
                            "Placement separation relaxed"
                        );
                    }
                    self.claim(candidate);
                    return Some(candidate);
                }
            }
            if separation == 0 {
                break;
            }
            separation = separation.saturating_sub(1);
        }

        let fallback = (0..self.grid.height)
            .flat_map(|y| (0..self.grid.width).map(move |x| Position::new(x, y)))
            .find(|&p| self.acceptable(p, 0, avoid_water))?;
        tracing::warn!(
            category,
            position = %fallback,
            "Placement fell back to grid scan"
        );
        self.claim(fallback);
        Some(fallback)
    }
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

const TOWN_NAMES: &[&str] = &[
    "Ashford", "Brightwater", "Copperhill", "Dunmere", "Eastwatch", "Fallowmere", "Greystone",
    "Hollowbrook", "Ironvale", "Juniper Cross",
];

const DUNGEON_NAMES: &[&str] = &[
    "Sunken Crypt", "Goblin Warren", "Howling Mine", "Forgotten Vault", "Spider Hollow",
    "Drowned Temple", "Ember Deep",
];

const MONSTER_NAMES: &[&str] = &[
    "Slime", "Wolf Pack", "Bandit", "Skeleton", "Giant Rat", "Wild Boar", "Harpy",
];

const RARE_NAMES: &[&str] = &["Elder Wyrm", "Gilded Golem", "Shadow Stalker", "Storm Roc"];

const MERCHANT_NAMES: &[&str] = &["Wandering Trader", "Tinker's Cart", "Spice Caravan"];

const EVENT_NAMES: &[&str] = &["Meteor Shower", "Harvest Festival", "Fairy Ring"];

fn pick(rng: &mut StdRng, names: &[&'static str]) -> String {
    let len = names.len().max(1);
    names
        .get(rng.random_range(0..len))
        .copied()
        .unwrap_or("Unknown")
        .to_owned()
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Accumulates generated objects with sequential ids.
struct Objects {
    next_id: u32,
    statics: Vec<StaticObject>,
    dynamics: Vec<DynamicObject>,
}

impl Objects {
    const fn new() -> Self {
        Self {
            next_id: 0,
            statics: Vec::new(),
            dynamics: Vec::new(),
        }
    }

    fn allocate(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    fn push_static(&mut self, name: String, position: Position, kind: StaticObjectKind) {
        let id = self.allocate();
        self.statics.push(StaticObject {
            id,
            name,
            position,
            kind,
        });
    }

    fn push_dynamic(&mut self, name: String, position: Position, kind: DynamicObjectKind) {
        let id = self.allocate();
        self.dynamics.push(DynamicObject {
            id,
            name,
            position,
            is_active: true,
            kind,
        });
    }
}

/// Place `count` static objects of one category.
fn place_statics<F>(
    placer: &mut Placer<'_>,
    rng: &mut StdRng,
    objects: &mut Objects,
    count: u32,
    category: &'static str,
    mut make: F,
) where
    F: FnMut(&mut StdRng) -> (String, StaticObjectKind),
{
    for placed in 0..count {
        let Some(position) = placer.place(rng, category) else {
            tracing::warn!(category, placed, requested = count, "Grid full, objects skipped");
            return;
        };
        let (name, kind) = make(rng);
        objects.push_static(name, position, kind);
    }
}

/// Place `count` dynamic objects of one category.
fn place_dynamics<F>(
    placer: &mut Placer<'_>,
    rng: &mut StdRng,
    objects: &mut Objects,
    count: u32,
    category: &'static str,
    mut make: F,
) where
    F: FnMut(&mut StdRng) -> (String, DynamicObjectKind),
{
    for placed in 0..count {
        let Some(position) = placer.place(rng, category) else {
            tracing::warn!(category, placed, requested = count, "Grid full, objects skipped");
            return;
        };
        let (name, kind) = make(rng);
        objects.push_dynamic(name, position, kind);
    }
}

/// Place portals two at a time; a pair whose second end cannot be placed is
/// dropped entirely.
fn place_portal_pairs(
    placer: &mut Placer<'_>,
    rng: &mut StdRng,
    objects: &mut Objects,
    pairs: u32,
) {
    for pair in 0..pairs {
        let Some(first) = placer.place(rng, "portal") else {
            tracing::warn!(placed = pair, requested = pairs, "Grid full, portal pairs skipped");
            return;
        };
        let Some(second) = placer.place(rng, "portal") else {
            placer.release(first);
            tracing::warn!(placed = pair, requested = pairs, "Grid full, portal pairs skipped");
            return;
        };
        let first_id = ObjectId(objects.next_id);
        let second_id = ObjectId(objects.next_id.saturating_add(1));
        let number = pair.saturating_add(1);
        objects.push_static(
            format!("Portal {number}A"),
            first,
            StaticObjectKind::Portal {
                linked_portal_id: second_id,
            },
        );
        objects.push_static(
            format!("Portal {number}B"),
            second,
            StaticObjectKind::Portal {
                linked_portal_id: first_id,
            },
        );
    }
}

/// Rename the town nearest the grid centre to [`CAPITAL_NAME`].
///
/// Distances are measured in doubled coordinates so the centre of an
/// even-sized grid stays integral. Ties go to the earliest placed town.
fn designate_capital(objects: &mut [StaticObject], width: u32, height: u32) -> Option<Position> {
    let cx = i64::from(width).saturating_sub(1);
    let cy = i64::from(height).saturating_sub(1);
    let capital = objects
        .iter_mut()
        .filter(|o| matches!(o.kind, StaticObjectKind::Town { .. }))
        .min_by_key(|o| {
            let dx = i64::from(o.position.x).saturating_mul(2).saturating_sub(cx);
            let dy = i64::from(o.position.y).saturating_mul(2).saturating_sub(cy);
            dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
        })?;
    capital.name = CAPITAL_NAME.to_owned();
    capital.kind = StaticObjectKind::Town { is_capital: true };
    Some(capital.position)
}

/// Generate a world map.
///
/// Pure apart from logging: the same `config` and `now` always produce the
/// same map. `now` only anchors the cycle timers.
pub fn generate(config: &WorldGenConfig, now: DateTime<Utc>) -> WorldMap {
    let width = config.width.max(1);
    let height = config.height.max(1);
    let mut rng = rng_for(&config.seed);

    let mut grid = TerrainGrid::random(width, height, &mut rng);
    grid.smooth();

    let mut objects = Objects::new();
    {
        let mut placer = Placer::new(&grid, config.min_separation, config.max_placement_attempts);
        let rng = &mut rng;

        place_statics(&mut placer, rng, &mut objects, config.town_count.max(1), "town", |r| {
            (pick(r, TOWN_NAMES), StaticObjectKind::Town { is_capital: false })
        });
        place_statics(&mut placer, rng, &mut objects, config.dungeon_count, "dungeon", |r| {
            let dungeon_level = r.random_range(1..=10);
            (
                pick(r, DUNGEON_NAMES),
                StaticObjectKind::DungeonEntrance { dungeon_level },
            )
        });
        place_portal_pairs(&mut placer, rng, &mut objects, config.portal_pairs);
        place_statics(&mut placer, rng, &mut objects, config.hidden_path_count, "hidden_path", |r| {
            let leads_to = Position::new(r.random_range(0..width), r.random_range(0..height));
            (
                "Hidden Path".to_owned(),
                StaticObjectKind::HiddenPath {
                    leads_to,
                    discovered: OneShot::default(),
                },
            )
        });
        place_statics(&mut placer, rng, &mut objects, config.resource_count, "treasure_chest", |r| {
            let gold = r.random_range(10..=100);
            (
                "Treasure Chest".to_owned(),
                StaticObjectKind::TreasureChest {
                    gold,
                    opened: OneShot::default(),
                },
            )
        });
        place_statics(&mut placer, rng, &mut objects, config.rare_spawn_count, "rare_spawn", |r| {
            let enemy_level = r.random_range(5..=15);
            (
                pick(r, RARE_NAMES),
                StaticObjectKind::RareSpawn {
                    enemy_level,
                    defeated: OneShot::default(),
                },
            )
        });
        let respawn = config.monster_respawn_minutes;
        place_dynamics(&mut placer, rng, &mut objects, config.encounter_count, "monster", |r| {
            let level = r.random_range(1..=8);
            (
                pick(r, MONSTER_NAMES),
                DynamicObjectKind::WanderingMonster {
                    level,
                    defeated: Rearming::new(respawn),
                },
            )
        });
        place_dynamics(&mut placer, rng, &mut objects, config.merchant_count, "merchant", |r| {
            let stock_tier = r.random_range(1..=3);
            (
                pick(r, MERCHANT_NAMES),
                DynamicObjectKind::TravelingMerchant { stock_tier },
            )
        });
        place_dynamics(&mut placer, rng, &mut objects, config.event_count, "event", |r| {
            let reward_gold = r.random_range(50..=200);
            (
                pick(r, EVENT_NAMES),
                DynamicObjectKind::Event {
                    reward_gold,
                    claimed: OneShot::default(),
                },
            )
        });
    }

    let capital = designate_capital(&mut objects.statics, width, height);

    let weather = initial_weather(&mut rng, &WeatherWeights::standard(), now, &config.cycles);
    let time_of_day = initial_time_of_day(now, &config.cycles);

    let mut map = WorldMap::from_parts(
        config.seed.clone(),
        width,
        height,
        grid.into_tiles(),
        weather,
        time_of_day,
    );
    for object in objects.statics {
        map.add_static_object(object);
    }
    for object in objects.dynamics {
        map.add_dynamic_object(object);
    }

    if let Some(center) = capital {
        fog::reveal(&mut map, center, config.initial_reveal_radius);
    }

    tracing::info!(
        seed = %config.seed,
        width,
        height,
        static_objects = map.static_objects().len(),
        dynamic_objects = map.dynamic_objects().len(),
        explored = map.explored_count(),
        "World generated"
    );
    map
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn daily_config() -> WorldGenConfig {
        WorldGenConfig {
            width: 50,
            height: 50,
            seed: "daily-2025-01-01".to_owned(),
            town_count: 4,
            dungeon_count: 5,
            initial_reveal_radius: 5,
            ..WorldGenConfig::default()
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate(&daily_config(), now());
        let b = generate(&daily_config(), now());
        assert_eq!(a, b);

        let other = generate(
            &WorldGenConfig {
                seed: "daily-2025-01-02".to_owned(),
                ..daily_config()
            },
            now(),
        );
        assert_ne!(a, other);
    }

    #[test]
    fn daily_scenario_has_one_capital_and_reveal() {
        let map = generate(&daily_config(), now());
        let capitals: Vec<_> = map
            .static_objects()
            .iter()
            .filter(|o| matches!(o.kind, StaticObjectKind::Town { is_capital: true }))
            .collect();
        assert_eq!(capitals.len(), 1);
        let capital = capitals.first().unwrap();
        assert_eq!(capital.name, CAPITAL_NAME);

        let towns = map
            .static_objects()
            .iter()
            .filter(|o| matches!(o.kind, StaticObjectKind::Town { .. }))
            .count();
        let dungeons = map
            .static_objects()
            .iter()
            .filter(|o| matches!(o.kind, StaticObjectKind::DungeonEntrance { .. }))
            .count();
        assert_eq!(towns, 4);
        assert_eq!(dungeons, 5);

        let p = capital.position;
        let span = |c: u32, max: u32| c.min(5) + (max - 1 - c).min(5) + 1;
        let expected = span(p.x, 50) * span(p.y, 50);
        assert!(map.explored_count() >= usize::try_from(expected).unwrap());
        if (5..45).contains(&p.x) && (5..45).contains(&p.y) {
            assert!(map.explored_count() >= 121);
        }
    }

    #[test]
    fn objects_never_share_a_tile() {
        let map = generate(&daily_config(), now());
        let mut seen = HashSet::new();
        for o in map.static_objects() {
            assert!(seen.insert(o.position), "duplicate position {}", o.position);
        }
        for o in map.dynamic_objects() {
            assert!(seen.insert(o.position), "duplicate position {}", o.position);
        }
    }

    #[test]
    fn objects_avoid_water() {
        let map = generate(&daily_config(), now());
        for o in map.static_objects() {
            assert_ne!(map.tile(o.position).unwrap().terrain, Terrain::Water);
        }
    }

    #[test]
    fn portals_are_symmetric() {
        let map = generate(&daily_config(), now());
        let portals: Vec<_> = map
            .static_objects()
            .iter()
            .filter(|o| matches!(o.kind, StaticObjectKind::Portal { .. }))
            .collect();
        assert_eq!(portals.len(), 4);
        for portal in portals {
            let partner = map.linked_portal(portal.id).unwrap();
            assert_eq!(map.linked_portal(partner.id).unwrap().id, portal.id);
        }
    }

    #[test]
    fn tiles_carry_terrain_cost_and_object_ids() {
        let map = generate(&daily_config(), now());
        for (position, tile) in map.tiles() {
            assert_eq!(tile.movement_cost, movement_cost(tile.terrain));
            if let Some(id) = tile.static_object {
                assert_eq!(map.static_object(id).unwrap().position, position);
            }
        }
    }

    #[test]
    fn overfull_grid_relaxes_instead_of_failing() {
        let config = WorldGenConfig {
            width: 4,
            height: 4,
            seed: "crowded".to_owned(),
            town_count: 6,
            dungeon_count: 6,
            encounter_count: 10,
            resource_count: 0,
            portal_pairs: 0,
            hidden_path_count: 0,
            rare_spawn_count: 0,
            merchant_count: 0,
            event_count: 0,
            min_separation: 3,
            max_placement_attempts: 4,
            initial_reveal_radius: 1,
            ..WorldGenConfig::default()
        };
        let map = generate(&config, now());
        let placed = map.static_objects().len() + map.dynamic_objects().len();
        assert_eq!(placed, 16);
        assert_eq!(map.static_objects().len(), 12);
        assert!(map.capital().is_some());
    }

    #[test]
    fn zero_towns_still_yields_a_capital() {
        let config = WorldGenConfig {
            width: 10,
            height: 10,
            town_count: 0,
            ..WorldGenConfig::default()
        };
        let map = generate(&config, now());
        assert!(map.capital().is_some());
    }

    #[test]
    fn cycles_start_in_the_future() {
        let map = generate(&daily_config(), now());
        assert!(map.weather().changes_at > now());
        assert_ne!(map.weather().current, map.weather().next);
        assert!(map.time_of_day().changes_at > now());
    }

    #[test]
    fn config_defaults_from_partial_yaml_shape() {
        let config: WorldGenConfig =
            serde_json::from_str(r#"{"width": 30, "cycles": {"weather_period_minutes": 15}}"#)
                .unwrap();
        assert_eq!(config.width, 30);
        assert_eq!(config.height, 50);
        assert_eq!(config.min_separation, 4);
        assert_eq!(config.cycles.weather_period_minutes, 15);
        assert_eq!(config.cycles.time_phase_minutes, 30);
    }
}
