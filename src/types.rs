//! MVSTORE - Core Type Definitions
//! Identity primitives and the isolation scopes every storage
//! operation is keyed by.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// Opaque entity identifier: a uuid plus the entity's type name.
/// Stable for the entity's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Id {
    uuid: Uuid,
    kind: String,
}

impl Id {
    /// Create a new time-ordered identifier of the given type.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::now_v7(),
            kind: kind.into(),
        }
    }

    /// Rebuild an identifier from its parts.
    pub fn from_parts(uuid: Uuid, kind: impl Into<String>) -> Self {
        Self {
            uuid,
            kind: kind.into(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.uuid)
    }
}

/// Parses the `kind:uuid` form produced by `Display`.
impl FromStr for Id {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, uuid) = s
            .rsplit_once(':')
            .ok_or_else(|| StoreError::validation(format!("expected kind:uuid, got '{}'", s)))?;
        if kind.is_empty() {
            return Err(StoreError::validation("id kind must not be empty"));
        }
        let uuid = Uuid::parse_str(uuid)
            .map_err(|e| StoreError::validation(format!("invalid uuid '{}': {}", uuid, e)))?;
        Ok(Self::from_parts(uuid, kind))
    }
}

/// Time-ordered 128-bit version identifier (UUID v7).
///
/// Stamps created in the same process are strictly increasing, and the
/// big-endian byte form sorts in creation order, so version columns are
/// laid out oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionStamp(Uuid);

impl VersionStamp {
    /// Stamp a new version.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// The all-zero stamp. Never produced by `new`; always rejected by validation.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for VersionStamp {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VersionStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tenant + collection name. Two scopes never share rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionScope {
    tenant: Id,
    name: String,
}

impl CollectionScope {
    pub fn new(tenant: Id, name: impl Into<String>) -> Self {
        Self {
            tenant,
            name: name.into(),
        }
    }

    pub fn tenant(&self) -> &Id {
        &self.tenant
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Owner + map name. The isolation unit of the map manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapScope {
    owner: Id,
    name: String,
}

impl MapScope {
    pub fn new(owner: Id, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }

    pub fn owner(&self) -> &Id {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
