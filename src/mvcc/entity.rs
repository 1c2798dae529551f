//! MVCC version records: log entries and entity versions.

use serde::{Deserialize, Serialize};

use crate::model::Entity;
use crate::types::{Id, VersionStamp};

/// Lifecycle stage of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Version write started, not yet committed.
    Active,
    /// Fully durable and visible.
    Committed,
}

impl Stage {
    pub fn is_transient(&self) -> bool {
        matches!(self, Stage::Active)
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, Stage::Committed)
    }
}

/// Durable record of where a version is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MvccLogEntry {
    entity_id: Id,
    version: VersionStamp,
    stage: Stage,
}

impl MvccLogEntry {
    pub fn new(entity_id: Id, version: VersionStamp, stage: Stage) -> Self {
        Self {
            entity_id,
            version,
            stage,
        }
    }

    pub fn entity_id(&self) -> &Id {
        &self.entity_id
    }

    pub fn version(&self) -> VersionStamp {
        self.version
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }
}

/// Payload state of one entity version.
///
/// "Never written" is not a payload state: a version that was never
/// written has no `MvccEntity` at all.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A live entity.
    Present(Entity),
    /// Tombstoned by a delete; physical removal is left to compaction.
    Cleared,
    /// No payload yet. Only valid inside the delete pipeline before commit.
    Pending,
}

impl Payload {
    pub fn entity(&self) -> Option<&Entity> {
        match self {
            Payload::Present(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn is_cleared(&self) -> bool {
        matches!(self, Payload::Cleared)
    }
}

/// One version of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct MvccEntity {
    id: Id,
    version: VersionStamp,
    payload: Payload,
}

impl MvccEntity {
    pub fn new(id: Id, version: VersionStamp, payload: Payload) -> Self {
        Self {
            id,
            version,
            payload,
        }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn version(&self) -> VersionStamp {
        self.version
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn entity(&self) -> Option<&Entity> {
        self.payload.entity()
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    pub(crate) fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }
}
