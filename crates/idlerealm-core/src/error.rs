//! Error types for player actions.
//!
//! Validation and resource failures are rejected before anything is
//! mutated. Persistence failures never surface here: the in-memory state is
//! authoritative and the flusher only logs them.

use idlerealm_player::PlayerError;
use idlerealm_types::{CharacterId, LocationKind, ObjectId, Position, ResourceKind};
use idlerealm_world::WorldError;

/// Errors returned by [`GameSession`](crate::session::GameSession) actions.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// A world-map rule rejected the action.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// An energy or equipment rule rejected the action.
    #[error("player error: {source}")]
    Player {
        /// The underlying player error.
        #[from]
        source: PlayerError,
    },

    /// No world map exists yet.
    #[error("no world has been generated")]
    NoWorld,

    /// Teleport target is not on the discovered locations list.
    #[error("location {0} has not been discovered")]
    NotDiscovered(Position),

    /// The player must stand on a specific kind of location.
    #[error("player at {position} is not at a {expected:?}")]
    NotAtLocation {
        /// Where the player stands.
        position: Position,
        /// The kind of location the action needs.
        expected: LocationKind,
    },

    /// The object is not on the player's tile.
    #[error("object {id} is at {object_position}, player is at {player_position}")]
    NotInReach {
        /// The object.
        id: ObjectId,
        /// Where the object is.
        object_position: Position,
        /// Where the player is.
        player_position: Position,
    },

    /// The object has no direct interaction.
    #[error("object {0} cannot be interacted with")]
    NotInteractive(ObjectId),

    /// The party has no member with this id.
    #[error("character not found: {0}")]
    CharacterNotFound(CharacterId),
}

impl ActionError {
    /// The resource this error reports as insufficient, if any.
    pub const fn insufficient_resource(&self) -> Option<ResourceKind> {
        match self {
            Self::Player { source } => source.insufficient_resource(),
            _ => None,
        }
    }

    /// Whether this is a plain validation rejection (as opposed to a
    /// resource shortage).
    pub const fn is_validation(&self) -> bool {
        self.insufficient_resource().is_none()
    }
}
