//! Interaction lifecycles of map objects.
//!
//! Chests, hidden paths, rare spawns and events carry a [`OneShot`] flag:
//! the first interaction consumes it and every later one reports
//! [`Consumption::AlreadyConsumed`]. Wandering monsters carry a
//! [`Rearming`] flag instead and come back after their respawn window,
//! applied lazily by [`rearm_due`].
//!
//! Repeating a consumed interaction is not an error; callers get an `Ok`
//! outcome telling them nothing happened.
//!
//! [`OneShot`]: idlerealm_types::OneShot
//! [`Rearming`]: idlerealm_types::Rearming

use chrono::{DateTime, Utc};
use idlerealm_types::{DynamicObjectKind, ObjectId, Position, StaticObjectKind};

use crate::error::WorldError;
use crate::world_map::WorldMap;

/// Outcome of consuming an interaction flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumption<T> {
    /// The flag was consumed now; carries the interaction's payload.
    Consumed(T),
    /// The flag had already been consumed. Nothing changed.
    AlreadyConsumed {
        /// When the object becomes available again, for re-arming objects.
        available_again_at: Option<DateTime<Utc>>,
    },
}

impl<T> Consumption<T> {
    /// Whether this call consumed the flag.
    pub const fn is_consumed_now(&self) -> bool {
        matches!(self, Self::Consumed(_))
    }

    const fn spent() -> Self {
        Self::AlreadyConsumed {
            available_again_at: None,
        }
    }
}

fn wrong_kind(id: ObjectId, expected: &'static str) -> WorldError {
    WorldError::WrongObjectKind { id, expected }
}

/// Open a treasure chest, yielding its gold.
///
/// # Errors
///
/// [`WorldError::ObjectNotFound`] or [`WorldError::WrongObjectKind`].
pub fn open_chest(
    map: &mut WorldMap,
    id: ObjectId,
    now: DateTime<Utc>,
) -> Result<Consumption<u32>, WorldError> {
    let object = map.static_object_mut(id).ok_or(WorldError::ObjectNotFound(id))?;
    let StaticObjectKind::TreasureChest { gold, opened } = &mut object.kind else {
        return Err(wrong_kind(id, "treasure chest"));
    };
    if !opened.consume(now) {
        return Ok(Consumption::spent());
    }
    tracing::debug!(object = %id, gold = *gold, "Chest opened");
    Ok(Consumption::Consumed(*gold))
}

/// Discover a hidden path, yielding its destination.
///
/// # Errors
///
/// [`WorldError::ObjectNotFound`] or [`WorldError::WrongObjectKind`].
pub fn discover_hidden_path(
    map: &mut WorldMap,
    id: ObjectId,
    now: DateTime<Utc>,
) -> Result<Consumption<Position>, WorldError> {
    let object = map.static_object_mut(id).ok_or(WorldError::ObjectNotFound(id))?;
    let StaticObjectKind::HiddenPath {
        leads_to,
        discovered,
    } = &mut object.kind
    else {
        return Err(wrong_kind(id, "hidden path"));
    };
    if !discovered.consume(now) {
        return Ok(Consumption::spent());
    }
    tracing::debug!(object = %id, leads_to = %leads_to, "Hidden path discovered");
    Ok(Consumption::Consumed(*leads_to))
}

/// Record a rare spawn as defeated, yielding its level.
///
/// # Errors
///
/// [`WorldError::ObjectNotFound`] or [`WorldError::WrongObjectKind`].
pub fn mark_rare_spawn_defeated(
    map: &mut WorldMap,
    id: ObjectId,
    now: DateTime<Utc>,
) -> Result<Consumption<u32>, WorldError> {
    let object = map.static_object_mut(id).ok_or(WorldError::ObjectNotFound(id))?;
    let StaticObjectKind::RareSpawn {
        enemy_level,
        defeated,
    } = &mut object.kind
    else {
        return Err(wrong_kind(id, "rare spawn"));
    };
    if !defeated.consume(now) {
        return Ok(Consumption::spent());
    }
    Ok(Consumption::Consumed(*enemy_level))
}

/// Whether a static object's one-shot flag is already consumed.
///
/// Objects without a flag (towns, dungeon entrances, portals) are never
/// consumed.
///
/// # Errors
///
/// [`WorldError::ObjectNotFound`].
pub fn is_consumed(map: &WorldMap, id: ObjectId) -> Result<bool, WorldError> {
    let object = map.static_object(id).ok_or(WorldError::ObjectNotFound(id))?;
    Ok(match &object.kind {
        StaticObjectKind::HiddenPath { discovered: flag, .. }
        | StaticObjectKind::TreasureChest { opened: flag, .. }
        | StaticObjectKind::RareSpawn { defeated: flag, .. } => flag.is_consumed(),
        StaticObjectKind::Town { .. }
        | StaticObjectKind::DungeonEntrance { .. }
        | StaticObjectKind::Portal { .. } => false,
    })
}

/// Record a wandering monster as defeated, yielding its level.
///
/// The monster goes inactive until its respawn window elapses. A monster
/// that is still down reports when it comes back.
///
/// # Errors
///
/// [`WorldError::ObjectNotFound`] or [`WorldError::WrongObjectKind`].
pub fn defeat_monster(
    map: &mut WorldMap,
    id: ObjectId,
    now: DateTime<Utc>,
) -> Result<Consumption<u32>, WorldError> {
    let object = map.dynamic_object_mut(id).ok_or(WorldError::ObjectNotFound(id))?;
    let DynamicObjectKind::WanderingMonster { level, defeated } = &mut object.kind else {
        return Err(wrong_kind(id, "wandering monster"));
    };
    // A monster whose window has passed but was not yet swept is fair game.
    if defeated.rearm_if_due(now) {
        object.is_active = true;
    }
    if !defeated.defeat(now) {
        return Ok(Consumption::AlreadyConsumed {
            available_again_at: defeated.rearms_at,
        });
    }
    let level = *level;
    object.is_active = false;
    tracing::debug!(object = %id, rearms_at = ?defeated.rearms_at, "Monster defeated");
    Ok(Consumption::Consumed(level))
}

/// Claim a world event, yielding its gold reward.
///
/// # Errors
///
/// [`WorldError::ObjectNotFound`] or [`WorldError::WrongObjectKind`].
pub fn claim_event(
    map: &mut WorldMap,
    id: ObjectId,
    now: DateTime<Utc>,
) -> Result<Consumption<u32>, WorldError> {
    let object = map.dynamic_object_mut(id).ok_or(WorldError::ObjectNotFound(id))?;
    let DynamicObjectKind::Event {
        reward_gold,
        claimed,
    } = &mut object.kind
    else {
        return Err(wrong_kind(id, "event"));
    };
    if !claimed.consume(now) {
        return Ok(Consumption::spent());
    }
    let reward = *reward_gold;
    object.is_active = false;
    Ok(Consumption::Consumed(reward))
}

/// Re-arm every monster whose respawn window has elapsed.
///
/// Returns how many came back.
pub fn rearm_due(map: &mut WorldMap, now: DateTime<Utc>) -> usize {
    let mut rearmed: usize = 0;
    for object in map.dynamic_objects_mut() {
        if let DynamicObjectKind::WanderingMonster { defeated, .. } = &mut object.kind
            && defeated.rearm_if_due(now)
        {
            object.is_active = true;
            rearmed = rearmed.saturating_add(1);
        }
    }
    if rearmed > 0 {
        tracing::debug!(rearmed, "Monsters respawned");
    }
    rearmed
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use idlerealm_types::{DynamicObject, OneShot, Rearming, StaticObject};

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn map_with_objects() -> WorldMap {
        let mut map = WorldMap::blank(10, 10);
        map.add_static_object(StaticObject {
            id: ObjectId(0),
            name: "Treasure Chest".to_owned(),
            position: Position::new(1, 1),
            kind: StaticObjectKind::TreasureChest {
                gold: 40,
                opened: OneShot::default(),
            },
        });
        map.add_static_object(StaticObject {
            id: ObjectId(1),
            name: "Hidden Path".to_owned(),
            position: Position::new(2, 2),
            kind: StaticObjectKind::HiddenPath {
                leads_to: Position::new(9, 9),
                discovered: OneShot::default(),
            },
        });
        map.add_static_object(StaticObject {
            id: ObjectId(2),
            name: "Ashford".to_owned(),
            position: Position::new(3, 3),
            kind: StaticObjectKind::Town { is_capital: true },
        });
        map.add_dynamic_object(DynamicObject {
            id: ObjectId(3),
            name: "Wolf Pack".to_owned(),
            position: Position::new(4, 4),
            is_active: true,
            kind: DynamicObjectKind::WanderingMonster {
                level: 3,
                defeated: Rearming::new(30),
            },
        });
        map.add_dynamic_object(DynamicObject {
            id: ObjectId(4),
            name: "Harvest Festival".to_owned(),
            position: Position::new(5, 5),
            is_active: true,
            kind: DynamicObjectKind::Event {
                reward_gold: 120,
                claimed: OneShot::default(),
            },
        });
        map
    }

    #[test]
    fn chest_opens_once() {
        let mut map = map_with_objects();
        assert_eq!(
            open_chest(&mut map, ObjectId(0), now()).unwrap(),
            Consumption::Consumed(40)
        );
        assert!(is_consumed(&map, ObjectId(0)).unwrap());
        assert_eq!(
            open_chest(&mut map, ObjectId(0), now() + Duration::days(1)).unwrap(),
            Consumption::AlreadyConsumed {
                available_again_at: None
            }
        );
    }

    #[test]
    fn hidden_path_yields_destination_once() {
        let mut map = map_with_objects();
        assert_eq!(
            discover_hidden_path(&mut map, ObjectId(1), now()).unwrap(),
            Consumption::Consumed(Position::new(9, 9))
        );
        assert!(
            !discover_hidden_path(&mut map, ObjectId(1), now())
                .unwrap()
                .is_consumed_now()
        );
    }

    #[test]
    fn wrong_kind_and_missing_ids_are_errors() {
        let mut map = map_with_objects();
        assert!(matches!(
            open_chest(&mut map, ObjectId(2), now()),
            Err(WorldError::WrongObjectKind { .. })
        ));
        assert_eq!(
            open_chest(&mut map, ObjectId(99), now()),
            Err(WorldError::ObjectNotFound(ObjectId(99)))
        );
        assert!(!is_consumed(&map, ObjectId(2)).unwrap());
    }

    #[test]
    fn monster_rearms_after_window() {
        let mut map = map_with_objects();
        let id = ObjectId(3);
        assert_eq!(
            defeat_monster(&mut map, id, now()).unwrap(),
            Consumption::Consumed(3)
        );
        assert!(!map.dynamic_object(id).unwrap().is_active);

        let back_at = now() + Duration::minutes(30);
        assert_eq!(
            defeat_monster(&mut map, id, now() + Duration::minutes(5)).unwrap(),
            Consumption::AlreadyConsumed {
                available_again_at: Some(back_at)
            }
        );

        assert_eq!(rearm_due(&mut map, back_at - Duration::seconds(1)), 0);
        assert_eq!(rearm_due(&mut map, back_at), 1);
        assert!(map.dynamic_object(id).unwrap().is_active);
        assert!(defeat_monster(&mut map, id, back_at).unwrap().is_consumed_now());
    }

    #[test]
    fn overdue_monster_can_be_fought_without_sweep() {
        let mut map = map_with_objects();
        let id = ObjectId(3);
        defeat_monster(&mut map, id, now()).unwrap();
        let later = now() + Duration::hours(2);
        assert!(defeat_monster(&mut map, id, later).unwrap().is_consumed_now());
    }

    #[test]
    fn event_claims_once_and_deactivates() {
        let mut map = map_with_objects();
        assert_eq!(
            claim_event(&mut map, ObjectId(4), now()).unwrap(),
            Consumption::Consumed(120)
        );
        assert!(!map.dynamic_object(ObjectId(4)).unwrap().is_active);
        assert!(!claim_event(&mut map, ObjectId(4), now()).unwrap().is_consumed_now());
    }
}
