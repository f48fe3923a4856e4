//! Background timer loop.
//!
//! Three independent intervals drive the time-dependent parts of a session
//! while the player is idle:
//!
//! - world checks (epoch rollover, weather, day/night, monster respawns)
//! - energy regeneration
//! - the presence heartbeat
//!
//! Each check takes the session lock briefly and re-validates its own
//! preconditions. The lock is never held across a network await: the
//! heartbeat copies what it needs first, and the final flush saves a
//! [`FlushHandle`](crate::store::FlushHandle) after releasing it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::config::TimerConfig;
use crate::outcome::WorldTick;
use crate::save::{PresenceService, SaveError, SaveService};
use crate::session::GameSession;

/// Source of wall-clock time for the timer loop.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

fn every(secs: u64) -> tokio::time::Interval {
    let mut timer = interval(Duration::from_secs(secs.max(1)));
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

/// Run the timers until `shutdown` resolves, then flush once more.
///
/// Returns whether the final flush wrote anything.
///
/// # Errors
///
/// Returns [`SaveError`] if the final flush fails. Heartbeat failures are
/// logged and ignored.
pub async fn run_timers<S, P, C, F>(
    session: Arc<Mutex<GameSession<S>>>,
    presence: Arc<P>,
    clock: C,
    config: TimerConfig,
    shutdown: F,
) -> Result<bool, SaveError>
where
    S: SaveService,
    P: PresenceService,
    C: Clock,
    F: Future<Output = ()>,
{
    let mut world_timer = every(config.cycle_check_secs);
    let mut regen_timer = every(config.regen_check_secs);
    let mut heartbeat_timer = every(config.heartbeat_secs);
    tokio::pin!(shutdown);

    info!(
        cycle_check_secs = config.cycle_check_secs,
        regen_check_secs = config.regen_check_secs,
        heartbeat_secs = config.heartbeat_secs,
        "Timers starting"
    );

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = world_timer.tick() => {
                let tick = session.lock().await.tick_world(clock.now());
                if tick != WorldTick::default() {
                    debug!(?tick, "World timers fired");
                }
            }
            _ = regen_timer.tick() => {
                session.lock().await.regenerate_energy(clock.now());
            }
            _ = heartbeat_timer.tick() => {
                let (player_id, position) = {
                    let guard = session.lock().await;
                    (guard.player_id(), guard.state().player.position)
                };
                if let Err(e) = presence.heartbeat(player_id, position).await {
                    warn!(%player_id, error = %e, "Presence heartbeat failed");
                }
            }
        }
    }

    info!("Timers stopped, flushing state");
    let handle = session.lock().await.flush_handle();
    handle.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use idlerealm_types::PlayerId;

    use super::*;
    use crate::combat::PowerCombatResolver;
    use crate::config::GameConfig;
    use crate::save::{MemoryPresence, MemorySaveService};
    use crate::state::GameState;

    /// Wall clock that follows Tokio's (pausable) clock.
    struct TokioClock {
        origin: DateTime<Utc>,
        started: tokio::time::Instant,
    }

    impl Clock for TokioClock {
        fn now(&self) -> DateTime<Utc> {
            let elapsed = ChronoDuration::from_std(self.started.elapsed()).unwrap();
            self.origin + elapsed
        }
    }

    fn origin() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T23:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn session(saver: Arc<MemorySaveService>) -> Arc<Mutex<GameSession<MemorySaveService>>> {
        let config = GameConfig::default();
        let state = GameState::new(PlayerId::new(), &config, origin());
        let mut session =
            GameSession::new(config, state, saver, Box::new(PowerCombatResolver::new()));
        session.ensure_world(origin());
        Arc::new(Mutex::new(session))
    }

    #[tokio::test(start_paused = true)]
    async fn timers_heartbeat_and_flush_on_shutdown() {
        let saver = Arc::new(MemorySaveService::new());
        let presence = Arc::new(MemoryPresence::new());
        let session = session(Arc::clone(&saver));
        let clock = TokioClock {
            origin: origin(),
            started: tokio::time::Instant::now(),
        };

        let flushed = run_timers(
            Arc::clone(&session),
            Arc::clone(&presence),
            clock,
            TimerConfig::default(),
            tokio::time::sleep(Duration::from_secs(40)),
        )
        .await
        .unwrap();

        // Heartbeats at 0 s, 15 s and 30 s.
        assert_eq!(presence.beats().await.len(), 3);
        // The debounced flusher may have saved already; either way nothing
        // is left dirty.
        assert!(flushed || saver.save_count() > 0);
        assert!(!session.lock().await.store().is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn midnight_rolls_the_world_over() {
        let saver = Arc::new(MemorySaveService::new());
        let presence = Arc::new(MemoryPresence::new());
        let session = session(saver);
        let clock = TokioClock {
            origin: origin(),
            started: tokio::time::Instant::now(),
        };

        run_timers(
            Arc::clone(&session),
            presence,
            clock,
            TimerConfig::default(),
            tokio::time::sleep(Duration::from_secs(2 * 60 * 60)),
        )
        .await
        .unwrap();

        let guard = session.lock().await;
        let map = guard.state().world.as_ref().unwrap();
        assert_eq!(map.epoch(), "daily-2025-01-02");
    }
}
