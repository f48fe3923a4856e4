//! Engine binary for Idlerealm.
//!
//! Loads one player's game and keeps it ticking while idle: day/night,
//! weather, energy regeneration, monster respawns, and the daily world
//! regeneration all run off the timer loop until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `idlerealm-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Connect to `Dragonfly`
//! 4. Load the saved game, or start a new one
//! 5. Run the timers until shutdown, then flush

mod error;

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use idlerealm_core::{GameConfig, GameSession, PowerCombatResolver, SystemClock, run_timers};
use idlerealm_db::{DragonflyPool, DragonflyPresence, DragonflySaveService};
use idlerealm_types::PlayerId;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the database connection, or the
/// initial load fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config = GameConfig::from_file_or_default(Path::new("idlerealm-config.yaml"))?;

    // 2. Initialize structured logging. RUST_LOG wins over the config.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        width = config.world.width,
        height = config.world.height,
        reveal_radius = config.exploration.reveal_radius,
        unlimited_energy = config.debug.unlimited_energy,
        "Configuration loaded"
    );
    if config.debug.unlimited_energy {
        warn!("Unlimited energy is enabled");
    }

    // 3. Connect to Dragonfly.
    let pool = DragonflyPool::connect(&config.persistence.dragonfly_url).await?;
    let saver = Arc::new(DragonflySaveService::new(pool.clone()));
    let presence = Arc::new(DragonflyPresence::new(pool, config.timers.heartbeat_secs));

    // 4. Load or create the game.
    let player_id = config.player.player_id.unwrap_or_else(|| {
        let id = PlayerId::new();
        warn!(%id, "No player id configured, starting a fresh player");
        id
    });
    let timers = config.timers.clone();
    let session = GameSession::load_or_create(
        config,
        saver,
        Box::new(PowerCombatResolver::new()),
        player_id,
        Utc::now(),
    )
    .await?;
    info!(
        %player_id,
        position = %session.state().player.position,
        energy = session.state().player.energy.current,
        "Game ready"
    );

    // 5. Run until Ctrl-C.
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C, shutting down");
        }
    };
    let flushed = Box::pin(run_timers(
        Arc::new(Mutex::new(session)),
        presence,
        SystemClock,
        timers,
        shutdown,
    ))
    .await?;

    info!(flushed, "idlerealm-engine shutdown complete");
    Ok(())
}
