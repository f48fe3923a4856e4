//! Weather and day/night cycle schedulers.
//!
//! Both cycles share one shape, [`CycleState`]: `current`, a pre-computed
//! `next`, and the instant `changes_at` when `next` takes over. They are
//! evaluated lazily -- callers invoke [`advance_weather_if_due`] or
//! [`advance_time_if_due`] on read or from a periodic check. A state that is
//! not yet due is returned untouched; an overdue state catches up fully in a
//! single call, however long the client was away.
//!
//! # Weather
//!
//! The next weather is a weighted draw over a fixed table with the outgoing
//! category's weight forced to zero for that draw, so weather never repeats:
//!
//! | Weather | Weight | Spawn multiplier |
//! |---------|--------|------------------|
//! | Clear   | 35     | 1.0              |
//! | Cloudy  | 25     | 1.0              |
//! | Rain    | 20     | 1.2              |
//! | Fog     | 10     | 1.3              |
//! | Storm   |  6     | 1.5              |
//! | Snow    |  4     | 0.8              |
//!
//! # Time of day
//!
//! A fixed ring, dawn -> day -> dusk -> night -> dawn, with no randomness.
//! Dawn and dusk admit both day and night enemies; day and night admit only
//! their own.

use chrono::{DateTime, Duration, Utc};
use idlerealm_types::{CycleState, TimeOfDay, Weather};
use rand::Rng;
use serde::Deserialize;

/// Upper bound on weather draws performed during one catch-up.
///
/// Older intermediate weather is unobservable, so only the most recent
/// transitions are replayed.
const MAX_CATCH_UP_DRAWS: u64 = 4;

/// Cycle period configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CycleConfig {
    /// Minutes each weather category lasts.
    #[serde(default = "default_weather_period_minutes")]
    pub weather_period_minutes: u32,

    /// Minutes each time-of-day phase lasts.
    #[serde(default = "default_time_phase_minutes")]
    pub time_phase_minutes: u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            weather_period_minutes: default_weather_period_minutes(),
            time_phase_minutes: default_time_phase_minutes(),
        }
    }
}

const fn default_weather_period_minutes() -> u32 {
    60
}

const fn default_time_phase_minutes() -> u32 {
    30
}

/// Period of one cycle step; never shorter than one minute.
fn period(minutes: u32) -> Duration {
    Duration::minutes(i64::from(minutes.max(1)))
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

/// A cycle category with a derived modifier consumed by encounter spawning.
pub trait CycleCategory: Copy + Eq + core::fmt::Debug {
    /// The modifier type this category derives.
    type Modifier;

    /// The modifier in effect while this category is current.
    fn modifier(self) -> Self::Modifier;
}

/// Which enemy pools may spawn during a time-of-day phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyEligibility {
    /// Day-active enemies may spawn.
    pub day_enemies: bool,
    /// Night-active enemies may spawn.
    pub night_enemies: bool,
}

impl CycleCategory for Weather {
    /// Encounter spawn-rate multiplier.
    type Modifier = f64;

    fn modifier(self) -> f64 {
        match self {
            Self::Clear | Self::Cloudy => 1.0,
            Self::Rain => 1.2,
            Self::Fog => 1.3,
            Self::Storm => 1.5,
            Self::Snow => 0.8,
        }
    }
}

impl CycleCategory for TimeOfDay {
    type Modifier = EnemyEligibility;

    fn modifier(self) -> EnemyEligibility {
        match self {
            Self::Dawn | Self::Dusk => EnemyEligibility {
                day_enemies: true,
                night_enemies: true,
            },
            Self::Day => EnemyEligibility {
                day_enemies: true,
                night_enemies: false,
            },
            Self::Night => EnemyEligibility {
                day_enemies: false,
                night_enemies: true,
            },
        }
    }
}

/// The modifier of a cycle's current category.
pub fn current_modifier<T: CycleCategory>(state: &CycleState<T>) -> T::Modifier {
    state.current.modifier()
}

// ---------------------------------------------------------------------------
// Weather weights
// ---------------------------------------------------------------------------

/// Weighted weather table.
///
/// Each entry is `(weather, weight)`. A random value in
/// `[0, total_weight)` selects the weather; the excluded category
/// contributes zero weight to that draw.
#[derive(Debug, Clone)]
pub struct WeatherWeights {
    entries: Vec<(Weather, u32)>,
}

impl Default for WeatherWeights {
    fn default() -> Self {
        Self::standard()
    }
}

impl WeatherWeights {
    /// The standard weather table.
    pub fn standard() -> Self {
        Self {
            entries: vec![
                (Weather::Clear, 35),
                (Weather::Cloudy, 25),
                (Weather::Rain, 20),
                (Weather::Fog, 10),
                (Weather::Storm, 6),
                (Weather::Snow, 4),
            ],
        }
    }

    fn weight_of(weather: Weather, weight: u32, excluding: Option<Weather>) -> u32 {
        if excluding == Some(weather) { 0 } else { weight }
    }

    /// Total weight with the excluded category zeroed.
    fn total_weight(&self, excluding: Option<Weather>) -> u32 {
        self.entries.iter().fold(0_u32, |total, &(weather, weight)| {
            total.saturating_add(Self::weight_of(weather, weight, excluding))
        })
    }

    /// Select the weather for a roll in `[0, total_weight(excluding))`.
    fn select(&self, roll: u32, excluding: Option<Weather>) -> Option<Weather> {
        let mut cumulative: u32 = 0;
        for &(weather, weight) in &self.entries {
            cumulative = cumulative.saturating_add(Self::weight_of(weather, weight, excluding));
            if roll < cumulative {
                return Some(weather);
            }
        }
        None
    }

    /// Draw a weather category, never returning `excluding`.
    ///
    /// If every other category has zero weight, the first listed category
    /// that differs from `excluding` is returned so the cycle still moves.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, excluding: Option<Weather>) -> Weather {
        let total = self.total_weight(excluding);
        if total > 0 {
            let roll = rng.random_range(0..total);
            if let Some(weather) = self.select(roll, excluding) {
                return weather;
            }
        }
        self.entries
            .iter()
            .map(|&(weather, _)| weather)
            .find(|&weather| Some(weather) != excluding)
            .unwrap_or(Weather::Clear)
    }
}

// ---------------------------------------------------------------------------
// Initial state
// ---------------------------------------------------------------------------

/// Build the initial weather state at `now`.
pub fn initial_weather<R: Rng + ?Sized>(
    rng: &mut R,
    weights: &WeatherWeights,
    now: DateTime<Utc>,
    config: &CycleConfig,
) -> CycleState<Weather> {
    let current = weights.draw(rng, None);
    let next = weights.draw(rng, Some(current));
    CycleState {
        current,
        next,
        changes_at: now + period(config.weather_period_minutes),
    }
}

const TIME_RING: [TimeOfDay; 4] = [
    TimeOfDay::Dawn,
    TimeOfDay::Day,
    TimeOfDay::Dusk,
    TimeOfDay::Night,
];

const fn ring_index(phase: TimeOfDay) -> u64 {
    match phase {
        TimeOfDay::Dawn => 0,
        TimeOfDay::Day => 1,
        TimeOfDay::Dusk => 2,
        TimeOfDay::Night => 3,
    }
}

/// The phase `steps` positions after `phase` on the ring.
pub fn rotate(phase: TimeOfDay, steps: u64) -> TimeOfDay {
    let index = ring_index(phase)
        .wrapping_add(steps.checked_rem(4).unwrap_or(0))
        .checked_rem(4)
        .unwrap_or(0);
    usize::try_from(index)
        .ok()
        .and_then(|i| TIME_RING.get(i))
        .copied()
        .unwrap_or(TimeOfDay::Dawn)
}

/// Build the initial day/night state at `now`.
///
/// Phases are aligned to wall-clock boundaries: the phase is
/// `(minutes since the Unix epoch / phase length) mod 4`, and `changes_at`
/// is the start of the following phase.
pub fn initial_time_of_day(now: DateTime<Utc>, config: &CycleConfig) -> CycleState<TimeOfDay> {
    let phase_minutes = i64::from(config.time_phase_minutes.max(1));
    let minutes = now.timestamp().div_euclid(60);
    let slot = minutes.div_euclid(phase_minutes);
    let current = rotate(TimeOfDay::Dawn, u64::try_from(slot.rem_euclid(4)).unwrap_or(0));
    let boundary_minutes = slot.saturating_add(1).saturating_mul(phase_minutes);
    let changes_at = DateTime::from_timestamp(boundary_minutes.saturating_mul(60), 0)
        .unwrap_or_else(|| now + period(config.time_phase_minutes));
    CycleState {
        current,
        next: rotate(current, 1),
        changes_at,
    }
}

// ---------------------------------------------------------------------------
// Advancement
// ---------------------------------------------------------------------------

/// Number of whole periods due at `now`, and the new `changes_at`.
///
/// Returns `None` when the state is not yet due.
fn due_steps(changes_at: DateTime<Utc>, now: DateTime<Utc>, period: Duration) -> Option<(u64, DateTime<Utc>)> {
    if now < changes_at {
        return None;
    }
    let period_secs = period.num_seconds().max(1);
    let overdue_secs = now.signed_duration_since(changes_at).num_seconds().max(0);
    let steps = overdue_secs.div_euclid(period_secs).saturating_add(1);
    let advance = Duration::try_seconds(steps.saturating_mul(period_secs));
    let new_changes_at = advance
        .and_then(|d| changes_at.checked_add_signed(d))
        .unwrap_or_else(|| now + period);
    Some((u64::try_from(steps).unwrap_or(1), new_changes_at))
}

/// Advance the weather if `changes_at` has passed.
///
/// Returns the number of periods that elapsed (`0` when nothing was due).
/// After the call `next != current` and `changes_at > now`.
pub fn advance_weather_if_due<R: Rng + ?Sized>(
    state: &mut CycleState<Weather>,
    now: DateTime<Utc>,
    rng: &mut R,
    weights: &WeatherWeights,
    config: &CycleConfig,
) -> u64 {
    let Some((steps, changes_at)) =
        due_steps(state.changes_at, now, period(config.weather_period_minutes))
    else {
        return 0;
    };
    for _ in 0..steps.min(MAX_CATCH_UP_DRAWS) {
        state.current = state.next;
        state.next = weights.draw(rng, Some(state.current));
    }
    state.changes_at = changes_at;
    tracing::debug!(
        weather = ?state.current,
        next = ?state.next,
        steps,
        "Weather advanced"
    );
    steps
}

/// Advance the day/night ring if `changes_at` has passed.
///
/// Returns the number of phases that elapsed (`0` when nothing was due).
pub fn advance_time_if_due(
    state: &mut CycleState<TimeOfDay>,
    now: DateTime<Utc>,
    config: &CycleConfig,
) -> u64 {
    let Some((steps, changes_at)) =
        due_steps(state.changes_at, now, period(config.time_phase_minutes))
    else {
        return 0;
    };
    state.current = rotate(state.current, steps);
    state.next = rotate(state.current, 1);
    state.changes_at = changes_at;
    tracing::debug!(time_of_day = ?state.current, steps, "Time of day advanced");
    steps
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn weights_total_is_100() {
        assert_eq!(WeatherWeights::standard().total_weight(None), 100);
        assert_eq!(
            WeatherWeights::standard().total_weight(Some(Weather::Clear)),
            65
        );
    }

    #[test]
    fn draw_never_returns_excluded() {
        let weights = WeatherWeights::standard();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..2_000 {
            for excluded in [Weather::Clear, Weather::Rain, Weather::Snow] {
                assert_ne!(weights.draw(&mut rng, Some(excluded)), excluded);
            }
        }
    }

    #[test]
    fn degenerate_table_still_moves() {
        let weights = WeatherWeights {
            entries: vec![(Weather::Clear, 10), (Weather::Rain, 0)],
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(weights.draw(&mut rng, Some(Weather::Clear)), Weather::Rain);
    }

    #[test]
    fn weather_not_due_is_unchanged() {
        let config = CycleConfig::default();
        let weights = WeatherWeights::standard();
        let mut rng = StdRng::seed_from_u64(7);
        let now = at("2025-01-01T00:00:00Z");
        let mut state = initial_weather(&mut rng, &weights, now, &config);
        let before = state;
        let steps = advance_weather_if_due(
            &mut state,
            now + Duration::minutes(59),
            &mut rng,
            &weights,
            &config,
        );
        assert_eq!(steps, 0);
        assert_eq!(state, before);
    }

    #[test]
    fn weather_look_ahead_invariant_holds() {
        let config = CycleConfig::default();
        let weights = WeatherWeights::standard();
        let mut rng = StdRng::seed_from_u64(99);
        let mut now = at("2025-01-01T00:00:00Z");
        let mut state = initial_weather(&mut rng, &weights, now, &config);
        assert_ne!(state.current, state.next);
        for _ in 0..500 {
            now += Duration::minutes(61);
            let previous_next = state.next;
            let steps = advance_weather_if_due(&mut state, now, &mut rng, &weights, &config);
            if steps == 1 {
                assert_eq!(state.current, previous_next);
            }
            assert_ne!(state.current, state.next);
            assert!(state.changes_at > now);
        }
    }

    #[test]
    fn weather_catches_up_after_long_absence() {
        let config = CycleConfig::default();
        let weights = WeatherWeights::standard();
        let mut rng = StdRng::seed_from_u64(5);
        let start = at("2025-01-01T00:00:00Z");
        let mut state = initial_weather(&mut rng, &weights, start, &config);
        let later = start + Duration::days(3) + Duration::minutes(10);
        let steps = advance_weather_if_due(&mut state, later, &mut rng, &weights, &config);
        assert_eq!(steps, 72);
        assert_eq!(state.changes_at, start + Duration::hours(73));
        assert!(state.changes_at > later);
        assert_ne!(state.current, state.next);
    }

    #[test]
    fn time_ring_order() {
        assert_eq!(rotate(TimeOfDay::Dawn, 1), TimeOfDay::Day);
        assert_eq!(rotate(TimeOfDay::Day, 1), TimeOfDay::Dusk);
        assert_eq!(rotate(TimeOfDay::Dusk, 1), TimeOfDay::Night);
        assert_eq!(rotate(TimeOfDay::Night, 1), TimeOfDay::Dawn);
        assert_eq!(rotate(TimeOfDay::Day, 6), TimeOfDay::Night);
    }

    #[test]
    fn initial_time_aligns_to_phase_boundary() {
        let config = CycleConfig::default();
        // 00:45 UTC on an epoch-aligned day: slot 1 of 30 minutes.
        let state = initial_time_of_day(at("2025-01-01T00:45:00Z"), &config);
        let slot = at("2025-01-01T00:45:00Z").timestamp() / 60 / 30;
        assert_eq!(state.current, rotate(TimeOfDay::Dawn, u64::try_from(slot % 4).unwrap()));
        assert_eq!(state.changes_at, at("2025-01-01T01:00:00Z"));
        assert_eq!(state.next, rotate(state.current, 1));
    }

    #[test]
    fn time_advances_deterministically() {
        let config = CycleConfig::default();
        let mut state = CycleState {
            current: TimeOfDay::Dawn,
            next: TimeOfDay::Day,
            changes_at: at("2025-01-01T06:00:00Z"),
        };
        assert_eq!(advance_time_if_due(&mut state, at("2025-01-01T05:59:59Z"), &config), 0);
        assert_eq!(advance_time_if_due(&mut state, at("2025-01-01T06:00:00Z"), &config), 1);
        assert_eq!(state.current, TimeOfDay::Day);
        assert_eq!(state.next, TimeOfDay::Dusk);
        assert_eq!(state.changes_at, at("2025-01-01T06:30:00Z"));

        // Five phases later in one call: Day + 5 = Night.
        let steps = advance_time_if_due(&mut state, at("2025-01-01T08:40:00Z"), &config);
        assert_eq!(steps, 5);
        assert_eq!(state.current, TimeOfDay::Night);
        assert_eq!(state.next, TimeOfDay::Dawn);
        assert_eq!(state.changes_at, at("2025-01-01T09:00:00Z"));
    }

    #[test]
    fn modifiers() {
        assert_eq!(Weather::Storm.modifier(), 1.5);
        assert_eq!(Weather::Snow.modifier(), 0.8);
        let night = TimeOfDay::Night.modifier();
        assert!(night.night_enemies && !night.day_enemies);
        let dusk = current_modifier(&CycleState {
            current: TimeOfDay::Dusk,
            next: TimeOfDay::Night,
            changes_at: at("2025-01-01T00:00:00Z"),
        });
        assert!(dusk.day_enemies && dusk.night_enemies);
    }
}
