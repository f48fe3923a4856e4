//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`fred`] and [`serde_json`] errors. The session only sees them as
//! [`SaveError`] through the `From` conversion below.

use idlerealm_core::SaveError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<DbError> for SaveError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Serialization(source) => Self::Serialization { source },
            other => Self::Backend {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_become_backend_errors() {
        let err: SaveError = DbError::Config("bad url".to_owned()).into();
        match err {
            SaveError::Backend { message } => assert!(message.contains("bad url")),
            SaveError::Serialization { .. } => panic!("expected a backend error"),
        }
    }

    #[test]
    fn json_errors_keep_their_kind() {
        let json = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: SaveError = DbError::Serialization(json).into();
        assert!(matches!(err, SaveError::Serialization { .. }));
    }
}
