//! Error types for the `idlerealm-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`]. World
//! generation itself is infallible; these errors come from queries and
//! mutations against an existing map.

use idlerealm_types::{ObjectId, Position};

/// Errors that can occur during world-map operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The position lies outside the grid.
    #[error("position {position} is outside the {width}x{height} map")]
    OutOfBounds {
        /// The offending position.
        position: Position,
        /// Grid width.
        width: u32,
        /// Grid height.
        height: u32,
    },

    /// Movement onto or through a tile still covered by fog.
    #[error("tile {0} has not been explored")]
    Unexplored(Position),

    /// No map object carries the given id.
    #[error("map object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// The object exists but is not of the kind the operation needs.
    #[error("map object {id} is not a {expected}")]
    WrongObjectKind {
        /// The object.
        id: ObjectId,
        /// The kind the operation expected.
        expected: &'static str,
    },

    /// A portal whose partner is missing from the map.
    #[error("portal {0} has no linked partner")]
    PortalUnlinked(ObjectId),
}
