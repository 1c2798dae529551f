use serde::{Deserialize, Serialize};

use crate::codec;
use crate::engine::{ColumnFamily, Keyspace, MutationBatch};
use crate::error::{Result, StoreError};
use crate::model::Entity;
use crate::mvcc::entity::{MvccEntity, Payload};
use crate::types::{CollectionScope, Id, VersionStamp};

use super::{entity_row, version_column, EntitySerializationStrategy};

/// On-disk payload. There is no stored form of `Payload::Pending`.
#[derive(Serialize, Deserialize)]
enum StoredPayload {
    Present(Entity),
    Cleared,
}

/// Entity versions in the `EntityVersions` family: one row per entity,
/// one column per version.
pub struct ColumnEntityStrategy {
    keyspace: Keyspace,
}

impl ColumnEntityStrategy {
    pub fn new(keyspace: Keyspace) -> Self {
        Self { keyspace }
    }

    fn put(
        &self,
        scope: &CollectionScope,
        entity_id: &Id,
        version: VersionStamp,
        payload: &StoredPayload,
    ) -> Result<MutationBatch> {
        let mut batch = self.keyspace.prepare_batch();
        batch.put_column(
            ColumnFamily::EntityVersions,
            entity_row(scope, entity_id)?,
            version_column(version),
            codec::encode(payload)?,
            None,
        );
        Ok(batch)
    }
}

impl EntitySerializationStrategy for ColumnEntityStrategy {
    fn write(&self, scope: &CollectionScope, entity: &MvccEntity) -> Result<MutationBatch> {
        let stored = match entity.payload() {
            Payload::Present(payload) => StoredPayload::Present(payload.clone()),
            Payload::Cleared => StoredPayload::Cleared,
            Payload::Pending => {
                return Err(StoreError::validation(format!(
                    "version {} of {} has no payload to write",
                    entity.version(),
                    entity.id()
                )))
            }
        };
        self.put(scope, entity.id(), entity.version(), &stored)
    }

    fn clear(
        &self,
        scope: &CollectionScope,
        entity_id: &Id,
        version: VersionStamp,
    ) -> Result<MutationBatch> {
        self.put(scope, entity_id, version, &StoredPayload::Cleared)
    }

    fn load(
        &self,
        scope: &CollectionScope,
        entity_id: &Id,
        version: VersionStamp,
    ) -> Result<Option<MvccEntity>> {
        let row = entity_row(scope, entity_id)?;
        let Some(cell) = self.keyspace.get_column(
            ColumnFamily::EntityVersions,
            &row,
            &version_column(version),
        )?
        else {
            return Ok(None);
        };
        let stored: StoredPayload = codec::decode(&cell.value, "entity payload")?;
        let payload = match stored {
            StoredPayload::Present(entity) => Payload::Present(entity),
            StoredPayload::Cleared => Payload::Cleared,
        };
        Ok(Some(MvccEntity::new(entity_id.clone(), version, payload)))
    }

    fn delete(
        &self,
        scope: &CollectionScope,
        entity_id: &Id,
        version: VersionStamp,
    ) -> Result<MutationBatch> {
        let mut batch = self.keyspace.prepare_batch();
        batch.delete_column(
            ColumnFamily::EntityVersions,
            entity_row(scope, entity_id)?,
            version_column(version),
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;

    fn scope() -> CollectionScope {
        CollectionScope::new(Id::new("organization"), "users")
    }

    #[test]
    fn test_write_load_clear() {
        let strategy = ColumnEntityStrategy::new(Keyspace::in_memory());
        let scope = scope();
        let id = Id::new("user");
        let version = VersionStamp::new();
        let entity = Entity::new(id.clone()).with_field("name", Field::String("erin".into()));

        let mvcc = MvccEntity::new(id.clone(), version, Payload::Present(entity.clone()));
        strategy.write(&scope, &mvcc).unwrap().execute().unwrap();
        let loaded = strategy.load(&scope, &id, version).unwrap().unwrap();
        assert_eq!(loaded.entity(), Some(&entity));

        strategy.clear(&scope, &id, version).unwrap().execute().unwrap();
        let cleared = strategy.load(&scope, &id, version).unwrap().unwrap();
        assert!(cleared.payload().is_cleared());
    }

    #[test]
    fn test_never_written_is_none() {
        let strategy = ColumnEntityStrategy::new(Keyspace::in_memory());
        let loaded = strategy
            .load(&scope(), &Id::new("user"), VersionStamp::new())
            .unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_pending_payload_not_writable() {
        let strategy = ColumnEntityStrategy::new(Keyspace::in_memory());
        let mvcc = MvccEntity::new(Id::new("user"), VersionStamp::new(), Payload::Pending);
        assert!(strategy.write(&scope(), &mvcc).unwrap_err().is_validation());
    }

    #[test]
    fn test_delete_is_physical() {
        let strategy = ColumnEntityStrategy::new(Keyspace::in_memory());
        let scope = scope();
        let id = Id::new("user");
        let version = VersionStamp::new();
        strategy.clear(&scope, &id, version).unwrap().execute().unwrap();

        strategy.delete(&scope, &id, version).unwrap().execute().unwrap();
        assert!(strategy.load(&scope, &id, version).unwrap().is_none());
    }
}
