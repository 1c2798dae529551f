//! Storage collaborators for log entries and entity versions.
//!
//! The pipeline only sees these traits; the column-store layouts live in
//! the submodules and can be swapped without touching any stage.

mod entity;
mod log_entry;

pub use self::entity::ColumnEntityStrategy;
pub use self::log_entry::ColumnLogEntryStrategy;

use crate::codec;
use crate::engine::MutationBatch;
use crate::error::{Result, StoreError};
use crate::types::{CollectionScope, Id, VersionStamp};

use super::entity::{MvccEntity, MvccLogEntry};

/// Persists `{entity id, version, stage}` records.
pub trait LogEntrySerializationStrategy: Send + Sync {
    /// Build the mutation that records `entry`. Nothing is submitted.
    fn write(&self, scope: &CollectionScope, entry: &MvccLogEntry) -> Result<MutationBatch>;

    fn load(
        &self,
        scope: &CollectionScope,
        entity_id: &Id,
        version: VersionStamp,
    ) -> Result<Option<MvccLogEntry>>;

    /// Up to `limit` entries for the entity, newest version first.
    /// With `before`, only versions strictly older than it.
    fn load_history(
        &self,
        scope: &CollectionScope,
        entity_id: &Id,
        before: Option<VersionStamp>,
        limit: usize,
    ) -> Result<Vec<MvccLogEntry>>;

    /// Physically remove one entry.
    fn delete(
        &self,
        scope: &CollectionScope,
        entity_id: &Id,
        version: VersionStamp,
    ) -> Result<MutationBatch>;
}

/// Persists, tombstones and retrieves per-version entity payloads.
pub trait EntitySerializationStrategy: Send + Sync {
    /// Build the mutation that stores this version's payload.
    fn write(&self, scope: &CollectionScope, entity: &MvccEntity) -> Result<MutationBatch>;

    /// Build the mutation that tombstones this version's payload. Not a physical delete.
    fn clear(
        &self,
        scope: &CollectionScope,
        entity_id: &Id,
        version: VersionStamp,
    ) -> Result<MutationBatch>;

    /// `None` if the version was never written.
    fn load(
        &self,
        scope: &CollectionScope,
        entity_id: &Id,
        version: VersionStamp,
    ) -> Result<Option<MvccEntity>>;

    /// Physically remove one version, for use by compaction.
    fn delete(
        &self,
        scope: &CollectionScope,
        entity_id: &Id,
        version: VersionStamp,
    ) -> Result<MutationBatch>;
}

/// Row holding every version of one entity within a scope.
fn entity_row(scope: &CollectionScope, entity_id: &Id) -> Result<Vec<u8>> {
    codec::encode(&(scope, entity_id))
}

/// Version columns sort oldest to newest.
fn version_column(version: VersionStamp) -> Vec<u8> {
    version.as_bytes().to_vec()
}

fn column_version(column: &[u8]) -> Result<VersionStamp> {
    let bytes: [u8; 16] = column.try_into().map_err(|_| {
        StoreError::Corruption(format!(
            "version column has {} bytes, expected 16",
            column.len()
        ))
    })?;
    Ok(VersionStamp::from_bytes(bytes))
}
