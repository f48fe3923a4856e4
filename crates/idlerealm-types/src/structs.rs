//! Core data structs: tiles, map objects, cycle state, energy, items, stats.
//!
//! Map objects are tagged unions keyed by a `type` field so every consumer
//! matches exhaustively. Interaction flags come in two lifecycle shapes:
//!
//! - [`OneShot`] -- consumed at most once, never reset (chests, hidden
//!   paths, rare spawns).
//! - [`Rearming`] -- consumed, then automatically re-armed once its respawn
//!   window has elapsed (wandering monsters).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ItemSlot, LocationKind, Terrain};
use crate::ids::{ItemId, ObjectId};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// An integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Column, `0..width`.
    pub x: u32,
    /// Row, `0..height`.
    pub y: u32,
}

impl Position {
    /// Construct a position.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Manhattan (taxicab) distance to `other`.
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
    }

    /// Chebyshev (king-move) distance to `other`.
    pub const fn chebyshev(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// One cell of the world grid.
///
/// Created once by the generator. Afterwards only `is_explored` changes,
/// and only from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Tile {
    /// Terrain type.
    pub terrain: Terrain,
    /// Movement cost in hundredths (100 = one energy per step).
    pub movement_cost: u32,
    /// Whether the fog has been lifted from this tile.
    pub is_explored: bool,
    /// The static object occupying this tile, if any.
    pub static_object: Option<ObjectId>,
}

// ---------------------------------------------------------------------------
// Interaction flag lifecycles
// ---------------------------------------------------------------------------

/// A flag that transitions from unconsumed to consumed exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OneShot {
    /// When the flag was consumed. `None` while still available.
    #[serde(default, deserialize_with = "crate::timestamp::deserialize_option")]
    #[ts(as = "Option<String>")]
    pub consumed_at: Option<DateTime<Utc>>,
}

impl OneShot {
    /// Whether the flag has been consumed.
    pub const fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// Consume the flag. Returns `false` (and changes nothing) if it was
    /// already consumed.
    pub fn consume(&mut self, now: DateTime<Utc>) -> bool {
        if self.consumed_at.is_some() {
            return false;
        }
        self.consumed_at = Some(now);
        true
    }
}

/// A defeat flag that re-arms after a fixed respawn window.
///
/// The next eligible time is computed at the moment of defeat, so re-arming
/// only needs to compare against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Rearming {
    /// Minutes between defeat and re-arming.
    pub respawn_minutes: u32,
    /// When the object becomes active again. `None` while active.
    #[serde(default, deserialize_with = "crate::timestamp::deserialize_option")]
    #[ts(as = "Option<String>")]
    pub rearms_at: Option<DateTime<Utc>>,
}

impl Rearming {
    /// Create an armed flag with the given respawn window.
    pub const fn new(respawn_minutes: u32) -> Self {
        Self {
            respawn_minutes,
            rearms_at: None,
        }
    }

    /// Whether the object is currently defeated.
    pub const fn is_defeated(&self) -> bool {
        self.rearms_at.is_some()
    }

    /// Mark defeated at `now`. Returns `false` if already defeated.
    pub fn defeat(&mut self, now: DateTime<Utc>) -> bool {
        if self.rearms_at.is_some() {
            return false;
        }
        self.rearms_at = Some(now + Duration::minutes(i64::from(self.respawn_minutes)));
        true
    }

    /// Re-arm if the respawn window has elapsed. Returns `true` on re-arm.
    pub fn rearm_if_due(&mut self, now: DateTime<Utc>) -> bool {
        match self.rearms_at {
            Some(at) if now >= at => {
                self.rearms_at = None;
                true
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Static objects
// ---------------------------------------------------------------------------

/// A permanent point of interest placed at generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StaticObject {
    /// Unique id within the world.
    pub id: ObjectId,
    /// Display name.
    pub name: String,
    /// Tile the object occupies.
    pub position: Position,
    /// Variant-specific data, tagged by `type`.
    #[serde(flatten)]
    pub kind: StaticObjectKind,
}

/// Variant data for a [`StaticObject`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum StaticObjectKind {
    /// A town; the designated starting town is the capital.
    Town {
        /// Whether this is the starting town.
        is_capital: bool,
    },
    /// Entrance to a re-enterable dungeon.
    DungeonEntrance {
        /// Recommended party level.
        dungeon_level: u32,
    },
    /// One end of a symmetric portal pair.
    Portal {
        /// The other end of the pair (lookup only).
        linked_portal_id: ObjectId,
    },
    /// A concealed shortcut to a distant tile.
    HiddenPath {
        /// Where the path leads once discovered.
        leads_to: Position,
        /// One-shot discovery flag.
        discovered: OneShot,
    },
    /// A chest of gold.
    TreasureChest {
        /// Gold inside.
        gold: u32,
        /// One-shot opened flag.
        opened: OneShot,
    },
    /// A rare monster that can be defeated once per world.
    RareSpawn {
        /// Level of the rare enemy.
        enemy_level: u32,
        /// One-shot defeated flag.
        defeated: OneShot,
    },
}

impl StaticObjectKind {
    /// The discovery category for this variant.
    pub const fn location_kind(&self) -> LocationKind {
        match self {
            Self::Town { .. } => LocationKind::Town,
            Self::DungeonEntrance { .. } => LocationKind::DungeonEntrance,
            Self::Portal { .. } => LocationKind::Portal,
            Self::HiddenPath { .. } => LocationKind::HiddenPath,
            Self::TreasureChest { .. } => LocationKind::TreasureChest,
            Self::RareSpawn { .. } => LocationKind::RareSpawn,
        }
    }
}

// ---------------------------------------------------------------------------
// Dynamic objects
// ---------------------------------------------------------------------------

/// A transient map object whose availability changes over time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DynamicObject {
    /// Unique id within the world.
    pub id: ObjectId,
    /// Display name.
    pub name: String,
    /// Current tile.
    pub position: Position,
    /// Whether the object can currently be interacted with.
    pub is_active: bool,
    /// Variant-specific data, tagged by `type`.
    #[serde(flatten)]
    pub kind: DynamicObjectKind,
}

/// Variant data for a [`DynamicObject`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DynamicObjectKind {
    /// A monster that respawns after being defeated.
    WanderingMonster {
        /// Monster level.
        level: u32,
        /// Re-arming defeat flag.
        defeated: Rearming,
    },
    /// A merchant passing through.
    TravelingMerchant {
        /// Quality tier of the merchant's stock.
        stock_tier: u32,
    },
    /// A limited world event with a one-time reward.
    Event {
        /// Gold granted when claimed.
        reward_gold: u32,
        /// One-shot claimed flag.
        claimed: OneShot,
    },
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// A named location the player has uncovered; the fast-travel list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DiscoveredLocation {
    /// Display name.
    pub name: String,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Category of the location.
    #[serde(rename = "type")]
    pub kind: LocationKind,
}

impl DiscoveredLocation {
    /// The location's grid position.
    pub const fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Cycle state
// ---------------------------------------------------------------------------

/// One-step-ahead state of a periodic cycle (weather, time of day).
///
/// `next` is computed at the moment `current` is set, so a reader can
/// always tell what is coming without re-deriving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CycleState<T> {
    /// Active category.
    pub current: T,
    /// Category that becomes active at `changes_at`.
    pub next: T,
    /// When `next` takes over.
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    #[ts(as = "String")]
    pub changes_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Energy
// ---------------------------------------------------------------------------

/// The player's action energy.
///
/// Invariant: `current <= max`. Mutated only through the energy economy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EnergyState {
    /// Energy available to spend.
    pub current: u32,
    /// Regeneration cap.
    pub max: u32,
    /// Energy regenerated per hour of wall-clock time.
    pub regen_rate: u32,
    /// Wall-clock instant up to which regeneration has been credited.
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    #[ts(as = "String")]
    pub last_evaluated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Stats and items
// ---------------------------------------------------------------------------

/// The five derived combat statistics.
///
/// Missing fields decode as zero, so bonus tables only list what they grant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "bindings/")]
pub struct Stats {
    /// Maximum hit points.
    pub hp: u32,
    /// Attack.
    pub atk: u32,
    /// Defence.
    pub def: u32,
    /// Speed.
    pub spd: u32,
    /// Critical chance, in percent.
    pub crit: f64,
}

impl Stats {
    /// All-zero stats.
    pub const ZERO: Self = Self {
        hp: 0,
        atk: 0,
        def: 0,
        spd: 0,
        crit: 0.0,
    };

    /// Component-wise saturating sum.
    #[must_use]
    pub fn plus(self, other: Self) -> Self {
        Self {
            hp: self.hp.saturating_add(other.hp),
            atk: self.atk.saturating_add(other.atk),
            def: self.def.saturating_add(other.def),
            spd: self.spd.saturating_add(other.spd),
            crit: self.crit + other.crit,
        }
    }

    /// Scale every component by `percent / 100`, rounding integers down.
    #[must_use]
    pub fn scaled_percent(self, percent: u32) -> Self {
        let scale = |value: u32| -> u32 {
            let scaled = u64::from(value)
                .saturating_mul(u64::from(percent))
                .checked_div(100)
                .unwrap_or(0);
            u32::try_from(scaled).unwrap_or(u32::MAX)
        };
        Self {
            hp: scale(self.hp),
            atk: scale(self.atk),
            def: scale(self.def),
            spd: scale(self.spd),
            crit: self.crit * f64::from(percent) / 100.0,
        }
    }

    /// Comparison score: `HP + 2*ATK + 1.5*DEF + SPD + 10*CRIT`.
    ///
    /// Used only for sorting gear and characters, never in a gameplay formula.
    pub fn power_score(&self) -> f64 {
        f64::from(self.hp)
            + 2.0 * f64::from(self.atk)
            + 1.5 * f64::from(self.def)
            + f64::from(self.spd)
            + 10.0 * self.crit
    }
}

/// An item instance. Defined by the inventory collaborator; consumed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Item {
    /// Unique instance id.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Required character level.
    pub level: u32,
    /// Logical slot.
    pub slot: ItemSlot,
    /// Equipment set membership, if any.
    #[serde(default)]
    pub set_id: Option<String>,
    /// Enchantment level (0 = unenchanted).
    #[serde(default)]
    pub enchant_level: u32,
    /// Stats before enchant scaling.
    pub base_stats: Stats,
}

/// Percentage added to every stat per enchant level.
pub const ENCHANT_PERCENT_PER_LEVEL: u32 = 10;

impl Item {
    /// The item's stat contribution with enchant scaling applied:
    /// each base stat times `(100 + 10 * enchant_level) / 100`.
    pub fn effective_stats(&self) -> Stats {
        let percent = ENCHANT_PERCENT_PER_LEVEL
            .saturating_mul(self.enchant_level)
            .saturating_add(100);
        self.base_stats.scaled_percent(percent)
    }
}
