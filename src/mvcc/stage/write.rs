//! Write stages.

use std::sync::Arc;

use crate::error::Result;
use crate::mvcc::entity::{MvccEntity, MvccLogEntry, Payload, Stage as LogStage};
use crate::mvcc::serialization::{EntitySerializationStrategy, LogEntrySerializationStrategy};
use crate::mvcc::validation;

use super::{CollectionIoEvent, Stage};

/// Opens a write: confirms the version on the payload and records it as `Active`.
pub struct WriteStart {
    log_strategy: Arc<dyn LogEntrySerializationStrategy>,
}

impl WriteStart {
    pub fn new(log_strategy: Arc<dyn LogEntrySerializationStrategy>) -> Self {
        Self { log_strategy }
    }
}

impl Stage for WriteStart {
    fn name(&self) -> &'static str {
        "write-start"
    }

    fn apply(
        &self,
        mut event: CollectionIoEvent<MvccEntity>,
    ) -> Result<CollectionIoEvent<MvccEntity>> {
        validation::verify_mvcc_entity_with_entity(event.event())?;

        let version = event.event().version();
        if let Payload::Present(entity) = event.event_mut().payload_mut() {
            entity.set_version(version);
        }

        let entity = event.event();
        let entry = MvccLogEntry::new(entity.id().clone(), version, LogStage::Active);
        let batch = self.log_strategy.write(event.scope(), &entry)?;
        batch.commit("write start")?;
        Ok(event)
    }
}

/// Checks the payload's fields and size. No I/O; runs before `WriteStart`.
pub struct WriteVerify {
    max_entity_size: usize,
}

impl WriteVerify {
    pub fn new(max_entity_size: usize) -> Self {
        Self { max_entity_size }
    }
}

impl Stage for WriteVerify {
    fn name(&self) -> &'static str {
        "write-verify"
    }

    fn apply(
        &self,
        event: CollectionIoEvent<MvccEntity>,
    ) -> Result<CollectionIoEvent<MvccEntity>> {
        validation::verify_mvcc_entity_with_entity(event.event())?;
        if let Some(entity) = event.event().entity() {
            validation::verify_entity_write(entity, self.max_entity_size)?;
        }
        Ok(event)
    }
}

/// Stores the payload and marks the version committed in one submission.
pub struct WriteCommit {
    log_strategy: Arc<dyn LogEntrySerializationStrategy>,
    entity_strategy: Arc<dyn EntitySerializationStrategy>,
}

impl WriteCommit {
    pub fn new(
        log_strategy: Arc<dyn LogEntrySerializationStrategy>,
        entity_strategy: Arc<dyn EntitySerializationStrategy>,
    ) -> Self {
        Self {
            log_strategy,
            entity_strategy,
        }
    }
}

impl Stage for WriteCommit {
    fn name(&self) -> &'static str {
        "write-commit"
    }

    fn apply(
        &self,
        event: CollectionIoEvent<MvccEntity>,
    ) -> Result<CollectionIoEvent<MvccEntity>> {
        let entity = event.event();
        validation::verify_mvcc_entity_with_entity(entity)?;

        let mut batch = self.entity_strategy.write(event.scope(), entity)?;
        let committed = MvccLogEntry::new(entity.id().clone(), entity.version(), LogStage::Committed);
        batch.merge_shallow(self.log_strategy.write(event.scope(), &committed)?);

        batch.commit("write commit")?;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Keyspace;
    use crate::error::StoreError;
    use crate::model::{Entity, Field};
    use crate::mvcc::serialization::{ColumnEntityStrategy, ColumnLogEntryStrategy};
    use crate::mvcc::stage::Pipeline;
    use crate::types::{CollectionScope, Id, VersionStamp};

    fn event(entity: Entity) -> CollectionIoEvent<MvccEntity> {
        CollectionIoEvent::new(
            CollectionScope::new(Id::new("organization"), "users"),
            MvccEntity::new(entity.id().clone(), VersionStamp::new(), Payload::Present(entity)),
        )
    }

    #[test]
    fn test_write_pipeline_commits_payload() {
        let keyspace = Keyspace::in_memory();
        let log = Arc::new(ColumnLogEntryStrategy::new(keyspace.clone()));
        let entities = Arc::new(ColumnEntityStrategy::new(keyspace.clone()));
        let pipeline = Pipeline::new("write")
            .with_stage(WriteVerify::new(1024))
            .with_stage(WriteStart::new(log.clone()))
            .with_stage(WriteCommit::new(log.clone(), entities.clone()));

        let entity = Entity::new(Id::new("user")).with_field("age", Field::Long(42));
        let done = pipeline.run(event(entity)).unwrap();

        let written = done.event();
        assert_eq!(written.entity().unwrap().version(), Some(written.version()));

        let entry = log
            .load(done.scope(), written.id(), written.version())
            .unwrap()
            .unwrap();
        assert!(entry.stage().is_committed());
        let stored = entities
            .load(done.scope(), written.id(), written.version())
            .unwrap()
            .unwrap();
        assert_eq!(stored.entity().unwrap().field("age"), Some(&Field::Long(42)));
        // start batch + commit batch
        assert_eq!(keyspace.metrics().batch_count(), 2);
    }

    #[test]
    fn test_verify_rejects_oversized_entity() {
        let entity = Entity::new(Id::new("user")).with_field("blob", Field::String("x".repeat(64)));
        let err = WriteVerify::new(16).apply(event(entity)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_rejected_payload_submits_nothing() {
        let keyspace = Keyspace::in_memory();
        let log = Arc::new(ColumnLogEntryStrategy::new(keyspace.clone()));
        let entities = Arc::new(ColumnEntityStrategy::new(keyspace.clone()));
        let pipeline = Pipeline::new("write")
            .with_stage(WriteVerify::new(1024))
            .with_stage(WriteStart::new(log.clone()))
            .with_stage(WriteCommit::new(log.clone(), entities));

        let bad = Entity::new(Id::new("user")).with_field("", Field::Long(1));
        let err = pipeline.run(event(bad)).unwrap_err();

        assert!(err.is_validation());
        assert_eq!(keyspace.metrics().batch_count(), 0);
        assert_eq!(keyspace.cell_count().unwrap(), 0);
    }

    #[test]
    fn test_start_requires_payload() {
        let keyspace = Keyspace::in_memory();
        let log = Arc::new(ColumnLogEntryStrategy::new(keyspace.clone()));
        let pending = CollectionIoEvent::new(
            CollectionScope::new(Id::new("organization"), "users"),
            MvccEntity::new(Id::new("user"), VersionStamp::new(), Payload::Pending),
        );

        let err = WriteStart::new(log).apply(pending).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(keyspace.metrics().batch_count(), 0);
    }
}
