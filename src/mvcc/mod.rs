//! MVSTORE - Multi-Version Concurrency Control
//! Append-only version history for entities. Every write or delete
//! creates a new version; a version is visible to readers only once its
//! log entry is `Committed`.

pub mod collection;
pub mod entity;
pub mod serialization;
pub mod stage;
pub mod validation;

pub use self::collection::EntityCollectionManager;
pub use self::entity::{MvccEntity, MvccLogEntry, Payload, Stage};
