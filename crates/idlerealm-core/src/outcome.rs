//! Results of successful session actions.

use chrono::{DateTime, Utc};
use idlerealm_types::{DiscoveredLocation, ObjectId, Position};

use crate::combat::CombatOutcome;

/// Result of any action that relocates the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Where the player stood.
    pub from: Position,
    /// Where the player stands now.
    pub to: Position,
    /// Energy deducted (zero under the unlimited-energy override).
    pub energy_spent: u32,
    /// Tiles newly uncovered around the destination.
    pub newly_explored: usize,
    /// Locations added to the discovered list.
    pub discovered: Vec<DiscoveredLocation>,
}

/// Result of a dungeon run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DungeonRun {
    /// The dungeon entrance.
    pub dungeon: ObjectId,
    /// Its recommended level.
    pub dungeon_level: u32,
    /// Energy deducted.
    pub energy_spent: u32,
    /// How the battle went.
    pub combat: CombatOutcome,
}

/// Result of interacting with a map object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// A chest was opened.
    ChestOpened {
        /// Gold added to the balance.
        gold: u32,
    },
    /// A hidden path was found and its far end revealed.
    PathRevealed {
        /// Where the path leads.
        leads_to: Position,
        /// Locations added to the discovered list.
        discovered: Vec<DiscoveredLocation>,
    },
    /// A battle was fought. On victory the object is marked defeated.
    Battle(CombatOutcome),
    /// A world event reward was claimed.
    EventClaimed {
        /// Gold added to the balance.
        gold: u32,
    },
    /// A traveling merchant is trading.
    Merchant {
        /// Quality tier of the stock.
        stock_tier: u32,
    },
    /// The object was already used up. Nothing changed.
    AlreadyConsumed {
        /// When a re-arming object becomes available again.
        available_again_at: Option<DateTime<Utc>>,
    },
}

/// What one pass of the world timers changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldTick {
    /// A new epoch began and the world was regenerated.
    pub regenerated: bool,
    /// Weather periods that elapsed.
    pub weather_steps: u64,
    /// Day/night phases that elapsed.
    pub time_steps: u64,
    /// Wandering monsters that came back.
    pub respawned: usize,
}
