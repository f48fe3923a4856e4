//! `Dragonfly` (Redis-compatible) connection and typed JSON access.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `player:{id}:snapshot` | JSON | Latest persisted game state |
//! | `player:{id}:presence` | JSON, with TTL | Last heartbeat (position and time) |

use fred::prelude::*;
use fred::types::Expiration;
use idlerealm_types::PlayerId;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DbError;

/// Key holding the player's latest snapshot.
pub fn snapshot_key(player_id: PlayerId) -> String {
    format!("player:{player_id}:snapshot")
}

/// Key holding the player's presence record.
pub fn presence_key(player_id: PlayerId) -> String {
    format!("player:{player_id}:presence")
}

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
#[derive(Clone)]
pub struct DragonflyPool {
    client: Client,
}

impl DragonflyPool {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    /// Serialize `value` as JSON and store it at `key`, optionally expiring
    /// after `ttl_secs`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if serialization fails.
    /// Returns [`DbError::Dragonfly`] if the write fails.
    pub async fn set_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: Option<u64>,
    ) -> Result<(), DbError> {
        let json = serde_json::to_string(value)?;
        let expiration =
            ttl_secs.map(|secs| Expiration::EX(i64::try_from(secs).unwrap_or(i64::MAX)));
        let _: () = self
            .client
            .set(key, json.as_str(), expiration, None, false)
            .await?;
        Ok(())
    }

    /// Read the value at `key` and deserialize it from JSON.
    ///
    /// Returns `None` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if deserialization fails.
    /// Returns [`DbError::Dragonfly`] if the read fails.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DbError> {
        let value: Option<String> = self.client.get(key).await?;
        value
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(DbError::from)
    }

    /// Delete a key from `Dragonfly`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the delete fails.
    pub async fn delete(&self, key: &str) -> Result<(), DbError> {
        let _: u32 = self.client.del(key).await?;
        Ok(())
    }

    /// Remaining time to live of `key` in seconds, `None` if the key is
    /// missing or never expires.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the read fails.
    pub async fn ttl(&self, key: &str) -> Result<Option<u64>, DbError> {
        let secs: i64 = self.client.ttl(key).await?;
        Ok(u64::try_from(secs).ok())
    }

    /// Return a reference to the underlying [`Client`].
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_per_player() {
        let id = PlayerId::new();
        assert_eq!(snapshot_key(id), format!("player:{id}:snapshot"));
        assert_eq!(presence_key(id), format!("player:{id}:presence"));
        assert_ne!(snapshot_key(id), snapshot_key(PlayerId::new()));
    }
}
