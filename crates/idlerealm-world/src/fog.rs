//! Fog of war and location discovery.
//!
//! Every tile starts covered. [`reveal`] lifts the fog in a square
//! (Chebyshev) neighbourhood around a point; tiles never return to the fog.
//! Movement may only cross explored tiles: the path walked from one tile to
//! another runs along x first, then along y, and every tile on it -- the
//! destination included -- must already be explored.
//!
//! Discovered locations are a projection of the fog: whenever a tile that
//! carries a static object is explored, that object becomes a
//! [`DiscoveredLocation`]. [`Discoveries`] keeps them append-only and
//! deduplicated by position; it doubles as the teleport list.

use idlerealm_types::{DiscoveredLocation, Position, StaticObject};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::world_map::WorldMap;

/// Result of a single [`reveal`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealOutcome {
    /// Number of tiles that were covered before this call.
    pub newly_explored: usize,
    /// Locations on the newly explored tiles, in row-major order.
    pub discovered: Vec<DiscoveredLocation>,
}

/// Project a static object into the discovery list form.
pub fn location_of(object: &StaticObject) -> DiscoveredLocation {
    DiscoveredLocation {
        name: object.name.clone(),
        x: object.position.x,
        y: object.position.y,
        kind: object.kind.location_kind(),
    }
}

/// Mark every tile within `radius` (Chebyshev) of `center` as explored.
///
/// The square is clipped at the grid edges. Calling this twice with the same
/// arguments explores nothing new the second time.
pub fn reveal(map: &mut WorldMap, center: Position, radius: u32) -> RevealOutcome {
    let mut outcome = RevealOutcome::default();
    if map.width() == 0 || map.height() == 0 {
        return outcome;
    }

    let min_x = center.x.saturating_sub(radius);
    let min_y = center.y.saturating_sub(radius);
    let max_x = center
        .x
        .saturating_add(radius)
        .min(map.width().saturating_sub(1));
    let max_y = center
        .y
        .saturating_add(radius)
        .min(map.height().saturating_sub(1));

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let position = Position::new(x, y);
            if map.mark_explored(position) != Some(true) {
                continue;
            }
            outcome.newly_explored = outcome.newly_explored.saturating_add(1);
            if let Some(object) = map.static_object_at(position) {
                outcome.discovered.push(location_of(object));
            }
        }
    }

    tracing::debug!(
        center = %center,
        radius,
        newly_explored = outcome.newly_explored,
        discovered = outcome.discovered.len(),
        "Fog revealed"
    );
    outcome
}

/// The tiles walked from `from` to `to`: along x first, then along y.
///
/// The starting tile is excluded; the destination is included. Returns an
/// empty path when `from == to`.
pub fn walk_path(from: Position, to: Position) -> Vec<Position> {
    let mut path = Vec::with_capacity(usize::try_from(from.manhattan(to)).unwrap_or(0));
    let mut cursor = from;
    while cursor.x != to.x {
        cursor.x = if cursor.x < to.x {
            cursor.x.saturating_add(1)
        } else {
            cursor.x.saturating_sub(1)
        };
        path.push(cursor);
    }
    while cursor.y != to.y {
        cursor.y = if cursor.y < to.y {
            cursor.y.saturating_add(1)
        } else {
            cursor.y.saturating_sub(1)
        };
        path.push(cursor);
    }
    path
}

/// Check that a move from `from` to `to` crosses only explored tiles.
///
/// # Errors
///
/// Returns [`WorldError::OutOfBounds`] if `to` is off the grid, or
/// [`WorldError::Unexplored`] naming the first covered tile on the path.
pub fn check_path_explored(map: &WorldMap, from: Position, to: Position) -> Result<(), WorldError> {
    map.check_bounds(to)?;
    walk_path(from, to)
        .into_iter()
        .find(|&step| !map.is_explored(step))
        .map_or(Ok(()), |step| Err(WorldError::Unexplored(step)))
}

/// Every static object currently standing on an explored tile.
///
/// Used to rebuild the discovery list for a freshly generated map, whose
/// initial reveal happens before any player state exists.
pub fn visible_locations(map: &WorldMap) -> Vec<DiscoveredLocation> {
    map.static_objects()
        .iter()
        .filter(|o| map.is_explored(o.position))
        .map(location_of)
        .collect()
}

/// The player's append-only list of discovered locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Discoveries(Vec<DiscoveredLocation>);

impl Discoveries {
    /// An empty list.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append `location` unless one at the same position is already known.
    ///
    /// Returns `true` if the list grew.
    pub fn add(&mut self, location: DiscoveredLocation) -> bool {
        if self.contains(location.position()) {
            return false;
        }
        self.0.push(location);
        true
    }

    /// Append every location not already known. Returns how many were added.
    pub fn extend<I>(&mut self, locations: I) -> usize
    where
        I: IntoIterator<Item = DiscoveredLocation>,
    {
        locations
            .into_iter()
            .map(|location| self.add(location))
            .filter(|&added| added)
            .count()
    }

    /// Whether a location at `position` has been discovered.
    pub fn contains(&self, position: Position) -> bool {
        self.0.iter().any(|l| l.position() == position)
    }

    /// The discovered location at `position`, if any.
    pub fn get(&self, position: Position) -> Option<&DiscoveredLocation> {
        self.0.iter().find(|l| l.position() == position)
    }

    /// Iterate in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &DiscoveredLocation> {
        self.0.iter()
    }

    /// Number of discovered locations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing has been discovered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow as a slice.
    pub fn as_slice(&self) -> &[DiscoveredLocation] {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idlerealm_types::{LocationKind, ObjectId, StaticObjectKind};

    use super::*;

    fn blank() -> WorldMap {
        WorldMap::blank(20, 20)
    }

    #[test]
    fn walk_path_goes_x_then_y() {
        let path = walk_path(Position::new(1, 1), Position::new(3, 0));
        assert_eq!(
            path,
            vec![Position::new(2, 1), Position::new(3, 1), Position::new(3, 0)]
        );
        assert!(walk_path(Position::new(4, 4), Position::new(4, 4)).is_empty());
    }

    #[test]
    fn reveal_is_monotonic_and_idempotent() {
        let mut map = blank();
        let first = reveal(&mut map, Position::new(10, 10), 2);
        assert_eq!(first.newly_explored, 25);
        assert_eq!(map.explored_count(), 25);
        let snapshot: Vec<bool> = map.tiles().map(|(_, t)| t.is_explored).collect();

        let second = reveal(&mut map, Position::new(10, 10), 2);
        assert_eq!(second.newly_explored, 0);
        assert!(second.discovered.is_empty());
        let after: Vec<bool> = map.tiles().map(|(_, t)| t.is_explored).collect();
        assert_eq!(snapshot, after);

        reveal(&mut map, Position::new(0, 0), 3);
        for (was, now) in snapshot.iter().zip(map.tiles().map(|(_, t)| t.is_explored)) {
            assert!(!was || now, "a tile went back into the fog");
        }
    }

    #[test]
    fn reveal_clips_at_edges() {
        let mut map = blank();
        let outcome = reveal(&mut map, Position::new(0, 0), 2);
        assert_eq!(outcome.newly_explored, 9);
        assert!(map.is_explored(Position::new(2, 2)));
        assert!(!map.is_explored(Position::new(3, 3)));

        let outcome = reveal(&mut map, Position::new(19, 19), 5);
        assert_eq!(outcome.newly_explored, 36);
    }

    #[test]
    fn reveal_discovers_static_objects() {
        let mut map = blank();
        let target = Position::new(12, 7);
        map.add_static_object(StaticObject {
            id: ObjectId(0),
            name: "Deep Hollow".to_owned(),
            position: target,
            kind: StaticObjectKind::DungeonEntrance { dungeon_level: 3 },
        });
        assert!(visible_locations(&map).is_empty());

        let outcome = reveal(&mut map, Position::new(11, 7), 1);
        assert_eq!(outcome.newly_explored, 9);
        assert_eq!(outcome.discovered.len(), 1);
        let found = outcome.discovered.first().unwrap();
        assert_eq!(found.position(), target);
        assert_eq!(found.kind, LocationKind::DungeonEntrance);
        assert_eq!(visible_locations(&map).len(), 1);
    }

    #[test]
    fn path_through_fog_is_rejected() {
        let mut map = blank();
        reveal(&mut map, Position::new(5, 5), 1);
        assert!(check_path_explored(&map, Position::new(5, 5), Position::new(6, 6)).is_ok());
        assert_eq!(
            check_path_explored(&map, Position::new(5, 5), Position::new(8, 5)),
            Err(WorldError::Unexplored(Position::new(7, 5)))
        );
        assert!(matches!(
            check_path_explored(&map, Position::new(5, 5), Position::new(50, 5)),
            Err(WorldError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn discoveries_dedup_by_position() {
        let mut list = Discoveries::new();
        let town = DiscoveredLocation {
            name: "Capital".to_owned(),
            x: 3,
            y: 4,
            kind: LocationKind::Town,
        };
        assert!(list.add(town.clone()));
        assert!(!list.add(DiscoveredLocation {
            name: "Renamed".to_owned(),
            ..town.clone()
        }));
        let added = list.extend(vec![
            town,
            DiscoveredLocation {
                name: "Deep Hollow".to_owned(),
                x: 9,
                y: 9,
                kind: LocationKind::DungeonEntrance,
            },
        ]);
        assert_eq!(added, 1);
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(Position::new(3, 4)).unwrap().name, "Capital");

        let json = serde_json::to_value(&list).unwrap();
        assert!(json.is_array());
    }
}
