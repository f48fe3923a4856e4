//! The energy economy.
//!
//! Energy is the single resource gating world actions. It regenerates from
//! wall-clock time at `regen_rate` points per hour up to `max`, and actions
//! spend it atomically: either the full cost is deducted or nothing
//! changes.
//!
//! The debug override (`unlimited`) short-circuits every sufficiency check
//! and leaves the stored value untouched, so switching it off restores the
//! exact balance the player had.
//!
//! All arithmetic is integer and saturating.

use chrono::{DateTime, Duration, Utc};
use idlerealm_types::EnergyState;

use crate::config::EnergyConfig;
use crate::error::PlayerError;

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// A full energy bar as of `now`.
pub const fn full(config: &EnergyConfig, now: DateTime<Utc>) -> EnergyState {
    EnergyState {
        current: config.max_energy,
        max: config.max_energy,
        regen_rate: config.regen_per_hour,
        last_evaluated_at: now,
    }
}

/// Check whether `cost` can be paid, without spending it.
///
/// # Errors
///
/// [`PlayerError::InsufficientEnergy`] carrying required, available and
/// shortfall.
pub const fn check(state: &EnergyState, cost: u32, unlimited: bool) -> Result<(), PlayerError> {
    if unlimited || state.current >= cost {
        return Ok(());
    }
    Err(PlayerError::InsufficientEnergy {
        required: cost,
        available: state.current,
        shortfall: cost.saturating_sub(state.current),
    })
}

/// Spend `cost` energy.
///
/// With `unlimited` set the check passes and nothing is deducted.
///
/// # Errors
///
/// [`PlayerError::InsufficientEnergy`]; the state is unchanged.
pub fn spend(state: &mut EnergyState, cost: u32, unlimited: bool) -> Result<(), PlayerError> {
    check(state, cost, unlimited)?;
    if !unlimited {
        state.current = state.current.saturating_sub(cost);
    }
    Ok(())
}

/// Energy earned over `elapsed` at `rate` per hour, rounded down.
fn earned(elapsed: Duration, rate: u32) -> u32 {
    let millis = elapsed.num_milliseconds().max(0);
    let points = i128::from(millis)
        .saturating_mul(i128::from(rate))
        .checked_div(i128::from(MILLIS_PER_HOUR))
        .unwrap_or(0);
    u32::try_from(points).unwrap_or(u32::MAX)
}

/// Add `floor(elapsed_hours * regen_rate)` energy, clamped to `max`.
///
/// Returns the amount actually gained. Does not move `last_evaluated_at`.
pub fn regenerate(state: &mut EnergyState, elapsed: Duration) -> u32 {
    let before = state.current.min(state.max);
    let after = before
        .saturating_add(earned(elapsed, state.regen_rate))
        .min(state.max);
    state.current = after;
    after.saturating_sub(before)
}

/// Regenerate for the wall-clock time since `last_evaluated_at`.
///
/// Only the time that was converted into whole points is consumed, so
/// frequent calls never lose the fractional remainder. At the cap the clock
/// jumps to `now`: time spent full is not banked. A `now` earlier than the
/// last evaluation resets the clock without granting anything.
///
/// Returns the amount gained.
pub fn regenerate_until(state: &mut EnergyState, now: DateTime<Utc>) -> u32 {
    if now <= state.last_evaluated_at {
        state.last_evaluated_at = now;
        return 0;
    }
    if state.current >= state.max || state.regen_rate == 0 {
        state.current = state.current.min(state.max);
        state.last_evaluated_at = now;
        return 0;
    }

    let elapsed = now.signed_duration_since(state.last_evaluated_at);
    let gained = regenerate(state, elapsed);
    if state.current >= state.max {
        state.last_evaluated_at = now;
    } else if gained > 0 {
        // Round up so the carried remainder never exceeds the true one.
        let rate = i64::from(state.regen_rate);
        let consumed_millis = i64::from(gained)
            .saturating_mul(MILLIS_PER_HOUR)
            .saturating_add(rate.saturating_sub(1))
            .checked_div(rate)
            .unwrap_or(0);
        state.last_evaluated_at = state
            .last_evaluated_at
            .checked_add_signed(Duration::milliseconds(consumed_millis))
            .unwrap_or(now)
            .min(now);
    }
    if gained > 0 {
        tracing::debug!(gained, current = state.current, max = state.max, "Energy regenerated");
    }
    gained
}

/// Energy cost of moving `distance` steps onto a tile of `tile_cost`.
///
/// `distance * ceil(tile_cost / 100)`.
pub const fn movement_cost(distance: u32, tile_cost: u32) -> u32 {
    distance.saturating_mul(tile_cost.div_ceil(100))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn state(current: u32) -> EnergyState {
        EnergyState {
            current,
            max: 100,
            regen_rate: 10,
            last_evaluated_at: at("2025-01-01T00:00:00Z"),
        }
    }

    #[test]
    fn spend_deducts_exactly() {
        let mut energy = state(30);
        spend(&mut energy, 12, false).unwrap();
        assert_eq!(energy.current, 18);
    }

    #[test]
    fn insufficient_spend_is_atomic() {
        let mut energy = state(4);
        let before = energy;
        assert_eq!(
            spend(&mut energy, 10, false),
            Err(PlayerError::InsufficientEnergy {
                required: 10,
                available: 4,
                shortfall: 6,
            })
        );
        assert_eq!(energy, before);
    }

    #[test]
    fn unlimited_override_leaves_balance_untouched() {
        let mut energy = state(2);
        spend(&mut energy, 50, true).unwrap();
        assert_eq!(energy.current, 2);
        assert!(check(&energy, 1_000, true).is_ok());
    }

    #[test]
    fn regenerate_one_and_a_half_hours() {
        let mut energy = state(0);
        let gained = regenerate(&mut energy, Duration::minutes(90));
        assert_eq!(gained, 15);
        assert_eq!(energy.current, 15);
    }

    #[test]
    fn regenerate_clamps_to_max() {
        let mut energy = state(95);
        assert_eq!(regenerate(&mut energy, Duration::hours(5)), 5);
        assert_eq!(energy.current, 100);
    }

    #[test]
    fn frequent_ticks_keep_the_remainder() {
        // 10/hour = one point every 6 minutes; tick every 4 minutes.
        let mut energy = state(0);
        let start = energy.last_evaluated_at;
        let mut total = 0;
        for minute in (4..=60).step_by(4) {
            total += regenerate_until(&mut energy, start + Duration::minutes(minute));
        }
        assert_eq!(total, 10);
        assert_eq!(energy.current, 10);
    }

    #[test]
    fn full_bar_does_not_bank_time() {
        let mut energy = state(100);
        let later = at("2025-01-01T10:00:00Z");
        assert_eq!(regenerate_until(&mut energy, later), 0);
        assert_eq!(energy.last_evaluated_at, later);
        energy.current = 90;
        assert_eq!(regenerate_until(&mut energy, later + Duration::minutes(6)), 1);
    }

    #[test]
    fn bounds_hold_after_every_operation() {
        let mut energy = state(50);
        let mut now = energy.last_evaluated_at;
        for step in 0_u32..200 {
            let _ = spend(&mut energy, step % 17, false);
            assert!(energy.current <= energy.max);
            now += Duration::minutes(i64::from(step % 11));
            regenerate_until(&mut energy, now);
            assert!(energy.current <= energy.max);
        }
    }

    #[test]
    fn movement_cost_rounds_tile_cost_up() {
        assert_eq!(movement_cost(3, 100), 3);
        assert_eq!(movement_cost(3, 150), 6);
        assert_eq!(movement_cost(2, 400), 8);
        assert_eq!(movement_cost(0, 300), 0);
    }
}
