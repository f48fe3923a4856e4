//! Data layer for Idlerealm (`Dragonfly`).
//!
//! The session treats persistence as an opaque collaborator. This crate
//! provides the production implementations of the two collaborator traits
//! from `idlerealm-core`:
//!
//! ```text
//! WorldStateStore flusher --save/load--> DragonflySaveService --> player:{id}:snapshot
//! Timer heartbeat ---------heartbeat---> DragonflyPresence   --> player:{id}:presence (TTL)
//! ```
//!
//! # Modules
//!
//! - [`dragonfly`] -- Connection pool and typed JSON operations
//! - [`services`] -- Save and presence collaborators
//! - [`error`] -- Shared error types

pub mod dragonfly;
pub mod error;
pub mod services;

// Re-export primary types for convenience.
pub use dragonfly::DragonflyPool;
pub use error::DbError;
pub use services::{DragonflyPresence, DragonflySaveService, PresenceRecord};
