//! Error types for the engine binary.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: idlerealm_core::ConfigError,
    },

    /// Connecting to `Dragonfly` failed.
    #[error("database error: {source}")]
    Db {
        /// The underlying data-layer error.
        #[from]
        source: idlerealm_db::DbError,
    },

    /// Loading or flushing the game state failed.
    #[error("save error: {source}")]
    Save {
        /// The underlying save error.
        #[from]
        source: idlerealm_core::SaveError,
    },
}
