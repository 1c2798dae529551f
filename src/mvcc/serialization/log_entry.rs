use crate::codec;
use crate::engine::{ColumnFamily, Keyspace, MutationBatch, ScanOrder};
use crate::error::Result;
use crate::mvcc::entity::{MvccLogEntry, Stage};
use crate::types::{CollectionScope, Id, VersionStamp};

use super::{column_version, entity_row, version_column, LogEntrySerializationStrategy};

/// Log entries in the `LogEntries` family: one row per entity, one
/// column per version, the stage as the value.
pub struct ColumnLogEntryStrategy {
    keyspace: Keyspace,
}

impl ColumnLogEntryStrategy {
    pub fn new(keyspace: Keyspace) -> Self {
        Self { keyspace }
    }
}

impl LogEntrySerializationStrategy for ColumnLogEntryStrategy {
    fn write(&self, scope: &CollectionScope, entry: &MvccLogEntry) -> Result<MutationBatch> {
        let mut batch = self.keyspace.prepare_batch();
        batch.put_column(
            ColumnFamily::LogEntries,
            entity_row(scope, entry.entity_id())?,
            version_column(entry.version()),
            codec::encode(&entry.stage())?,
            None,
        );
        Ok(batch)
    }

    fn load(
        &self,
        scope: &CollectionScope,
        entity_id: &Id,
        version: VersionStamp,
    ) -> Result<Option<MvccLogEntry>> {
        let row = entity_row(scope, entity_id)?;
        let Some(cell) = self.keyspace.get_column(
            ColumnFamily::LogEntries,
            &row,
            &version_column(version),
        )?
        else {
            return Ok(None);
        };
        let stage: Stage = codec::decode(&cell.value, "log entry stage")?;
        Ok(Some(MvccLogEntry::new(entity_id.clone(), version, stage)))
    }

    fn load_history(
        &self,
        scope: &CollectionScope,
        entity_id: &Id,
        before: Option<VersionStamp>,
        limit: usize,
    ) -> Result<Vec<MvccLogEntry>> {
        let row = entity_row(scope, entity_id)?;
        let start = before.map(version_column);
        let page = self.keyspace.scan_columns(
            ColumnFamily::LogEntries,
            &row,
            start.as_deref(),
            limit,
            ScanOrder::Descending,
        )?;
        page.columns
            .iter()
            .map(|(column, cell)| {
                let stage: Stage = codec::decode(&cell.value, "log entry stage")?;
                Ok(MvccLogEntry::new(
                    entity_id.clone(),
                    column_version(column)?,
                    stage,
                ))
            })
            .collect()
    }

    fn delete(
        &self,
        scope: &CollectionScope,
        entity_id: &Id,
        version: VersionStamp,
    ) -> Result<MutationBatch> {
        let mut batch = self.keyspace.prepare_batch();
        batch.delete_column(
            ColumnFamily::LogEntries,
            entity_row(scope, entity_id)?,
            version_column(version),
        );
        Ok(batch)
    }
}
