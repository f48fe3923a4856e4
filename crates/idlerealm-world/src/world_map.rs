//! The per-player world: tile grid, map objects, and environmental cycles.
//!
//! A [`WorldMap`] is created by the generator for one daily epoch and
//! replaced wholesale when the epoch rolls over. After creation the tile
//! grid only changes through fog reveal (`is_explored` false -> true), and
//! map objects only change through their interaction flags.
//!
//! Tiles are stored row-major: index `y * width + x`.

use idlerealm_types::{
    CycleState, DynamicObject, ObjectId, Position, StaticObject, StaticObjectKind, Tile, TimeOfDay,
    Weather,
};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// The explorable world of one player for one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldMap {
    /// Seed string this map was generated from.
    epoch: String,
    /// Grid width in tiles.
    width: u32,
    /// Grid height in tiles.
    height: u32,
    /// Row-major tile grid.
    tiles: Vec<Tile>,
    /// Permanent points of interest.
    static_objects: Vec<StaticObject>,
    /// Transient objects (monsters, merchants, events).
    dynamic_objects: Vec<DynamicObject>,
    /// Weather cycle.
    weather: CycleState<Weather>,
    /// Day/night cycle.
    time_of_day: CycleState<TimeOfDay>,
}

impl WorldMap {
    /// Assemble a map from generated parts. Objects are attached afterwards
    /// with [`add_static_object`](Self::add_static_object) and
    /// [`add_dynamic_object`](Self::add_dynamic_object).
    pub(crate) fn from_parts(
        epoch: String,
        width: u32,
        height: u32,
        tiles: Vec<Tile>,
        weather: CycleState<Weather>,
        time_of_day: CycleState<TimeOfDay>,
    ) -> Self {
        Self {
            epoch,
            width,
            height,
            tiles,
            static_objects: Vec::new(),
            dynamic_objects: Vec::new(),
            weather,
            time_of_day,
        }
    }

    /// An all-plains, fully fogged map with no objects.
    #[cfg(test)]
    pub(crate) fn blank(width: u32, height: u32) -> Self {
        use chrono::{DateTime, Utc};
        use idlerealm_types::Terrain;

        let count = usize::try_from(width.saturating_mul(height)).unwrap_or(0);
        let tile = Tile {
            terrain: Terrain::Plains,
            movement_cost: 100,
            is_explored: false,
            static_object: None,
        };
        let at = DateTime::<Utc>::UNIX_EPOCH;
        Self::from_parts(
            "test".to_owned(),
            width,
            height,
            vec![tile; count],
            CycleState {
                current: Weather::Clear,
                next: Weather::Rain,
                changes_at: at,
            },
            CycleState {
                current: TimeOfDay::Dawn,
                next: TimeOfDay::Day,
                changes_at: at,
            },
        )
    }

    // -------------------------------------------------------------------
    // Grid
    // -------------------------------------------------------------------

    /// Seed string (epoch key) this map was generated from.
    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    /// Grid width.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether `position` lies on the grid.
    pub const fn in_bounds(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    /// Ensure `position` lies on the grid.
    pub const fn check_bounds(&self, position: Position) -> Result<(), WorldError> {
        if self.in_bounds(position) {
            Ok(())
        } else {
            Err(WorldError::OutOfBounds {
                position,
                width: self.width,
                height: self.height,
            })
        }
    }

    fn index(&self, position: Position) -> Option<usize> {
        if !self.in_bounds(position) {
            return None;
        }
        let row = usize::try_from(position.y).ok()?;
        let col = usize::try_from(position.x).ok()?;
        let width = usize::try_from(self.width).ok()?;
        row.checked_mul(width)?.checked_add(col)
    }

    /// The tile at `position`, if on the grid.
    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.index(position).and_then(|i| self.tiles.get(i))
    }

    /// Iterate over every tile with its position, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = (Position, &Tile)> {
        let width = self.width.max(1);
        self.tiles.iter().zip(0_u32..).map(move |(tile, i)| {
            let x = i.checked_rem(width).unwrap_or(0);
            let y = i.checked_div(width).unwrap_or(0);
            (Position::new(x, y), tile)
        })
    }

    /// Whether the tile at `position` is explored. Off-grid tiles are not.
    pub fn is_explored(&self, position: Position) -> bool {
        self.tile(position).is_some_and(|t| t.is_explored)
    }

    /// Number of explored tiles.
    pub fn explored_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_explored).count()
    }

    /// Lift the fog from one tile.
    ///
    /// Returns `Some(true)` if the tile was newly explored, `Some(false)` if
    /// it already was, and `None` if the position is off-grid. There is no
    /// way to set a tile back to unexplored.
    pub(crate) fn mark_explored(&mut self, position: Position) -> Option<bool> {
        let index = self.index(position)?;
        let tile = self.tiles.get_mut(index)?;
        if tile.is_explored {
            return Some(false);
        }
        tile.is_explored = true;
        Some(true)
    }

    // -------------------------------------------------------------------
    // Objects
    // -------------------------------------------------------------------

    /// Attach a static object and record it on its tile.
    pub(crate) fn add_static_object(&mut self, object: StaticObject) {
        if let Some(index) = self.index(object.position)
            && let Some(tile) = self.tiles.get_mut(index)
        {
            tile.static_object = Some(object.id);
        }
        self.static_objects.push(object);
    }

    /// Attach a dynamic object.
    pub(crate) fn add_dynamic_object(&mut self, object: DynamicObject) {
        self.dynamic_objects.push(object);
    }

    /// All static objects in placement order.
    pub fn static_objects(&self) -> &[StaticObject] {
        &self.static_objects
    }

    /// All dynamic objects in placement order.
    pub fn dynamic_objects(&self) -> &[DynamicObject] {
        &self.dynamic_objects
    }

    /// Look up a static object by id.
    pub fn static_object(&self, id: ObjectId) -> Option<&StaticObject> {
        self.static_objects.iter().find(|o| o.id == id)
    }

    pub(crate) fn static_object_mut(&mut self, id: ObjectId) -> Option<&mut StaticObject> {
        self.static_objects.iter_mut().find(|o| o.id == id)
    }

    /// Look up a dynamic object by id.
    pub fn dynamic_object(&self, id: ObjectId) -> Option<&DynamicObject> {
        self.dynamic_objects.iter().find(|o| o.id == id)
    }

    pub(crate) fn dynamic_object_mut(&mut self, id: ObjectId) -> Option<&mut DynamicObject> {
        self.dynamic_objects.iter_mut().find(|o| o.id == id)
    }

    pub(crate) fn dynamic_objects_mut(&mut self) -> impl Iterator<Item = &mut DynamicObject> {
        self.dynamic_objects.iter_mut()
    }

    /// The static object standing on `position`, if any.
    pub fn static_object_at(&self, position: Position) -> Option<&StaticObject> {
        self.tile(position)
            .and_then(|t| t.static_object)
            .and_then(|id| self.static_object(id))
    }

    /// The designated starting town.
    pub fn capital(&self) -> Option<&StaticObject> {
        self.static_objects
            .iter()
            .find(|o| matches!(o.kind, StaticObjectKind::Town { is_capital: true }))
    }

    /// Resolve the partner of a portal.
    pub fn linked_portal(&self, id: ObjectId) -> Result<&StaticObject, WorldError> {
        let portal = self.static_object(id).ok_or(WorldError::ObjectNotFound(id))?;
        let StaticObjectKind::Portal { linked_portal_id } = &portal.kind else {
            return Err(WorldError::WrongObjectKind {
                id,
                expected: "portal",
            });
        };
        self.static_object(*linked_portal_id)
            .ok_or(WorldError::PortalUnlinked(id))
    }

    // -------------------------------------------------------------------
    // Cycles
    // -------------------------------------------------------------------

    /// Current weather cycle state.
    pub const fn weather(&self) -> &CycleState<Weather> {
        &self.weather
    }

    /// Mutable weather cycle state, for the scheduler.
    pub const fn weather_mut(&mut self) -> &mut CycleState<Weather> {
        &mut self.weather
    }

    /// Current day/night cycle state.
    pub const fn time_of_day(&self) -> &CycleState<TimeOfDay> {
        &self.time_of_day
    }

    /// Mutable day/night cycle state, for the scheduler.
    pub const fn time_of_day_mut(&mut self) -> &mut CycleState<TimeOfDay> {
        &mut self.time_of_day
    }
}
