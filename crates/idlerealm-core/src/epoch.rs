//! The daily epoch.
//!
//! Every UTC calendar day has its own world, seeded with
//! `daily-YYYY-MM-DD`. Crossing midnight UTC invalidates the current map; a
//! fresh one is generated on next access.

use chrono::{DateTime, Utc};

/// The epoch key (and world seed) for the UTC day containing `now`.
pub fn epoch_for(now: DateTime<Utc>) -> String {
    format!("daily-{}", now.format("%Y-%m-%d"))
}

/// Whether a map generated for `epoch` is still valid at `now`.
pub fn is_current(epoch: &str, now: DateTime<Utc>) -> bool {
    epoch == epoch_for(now)
}
