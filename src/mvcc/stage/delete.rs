//! Delete stages.

use std::sync::Arc;

use crate::error::Result;
use crate::mvcc::entity::{MvccEntity, MvccLogEntry, Payload, Stage as LogStage};
use crate::mvcc::serialization::{EntitySerializationStrategy, LogEntrySerializationStrategy};
use crate::mvcc::validation;

use super::{CollectionIoEvent, Stage};

/// Opens a delete: records the new version as `Active` with no payload yet.
pub struct DeleteStart {
    log_strategy: Arc<dyn LogEntrySerializationStrategy>,
}

impl DeleteStart {
    pub fn new(log_strategy: Arc<dyn LogEntrySerializationStrategy>) -> Self {
        Self { log_strategy }
    }
}

impl Stage for DeleteStart {
    fn name(&self) -> &'static str {
        "delete-start"
    }

    fn apply(
        &self,
        mut event: CollectionIoEvent<MvccEntity>,
    ) -> Result<CollectionIoEvent<MvccEntity>> {
        validation::verify_mvcc_entity_optional_entity(event.event())?;
        *event.event_mut().payload_mut() = Payload::Pending;

        let entity = event.event();
        let entry = MvccLogEntry::new(entity.id().clone(), entity.version(), LogStage::Active);
        let batch = self.log_strategy.write(event.scope(), &entry)?;
        batch.commit("delete start")?;
        Ok(event)
    }
}

/// Finalizes a delete: marks the version committed and tombstones its
/// payload in one submission.
///
/// The payload is cleared, not removed; physical removal of cleared
/// versions belongs to compaction. Re-running the commit for the same
/// version rewrites identical cells and is safe.
pub struct DeleteCommit {
    log_strategy: Arc<dyn LogEntrySerializationStrategy>,
    entity_strategy: Arc<dyn EntitySerializationStrategy>,
}

impl DeleteCommit {
    pub fn new(
        log_strategy: Arc<dyn LogEntrySerializationStrategy>,
        entity_strategy: Arc<dyn EntitySerializationStrategy>,
    ) -> Self {
        Self {
            log_strategy,
            entity_strategy,
        }
    }

    /// Commit the delete described by `event`.
    pub fn commit(&self, event: &CollectionIoEvent<MvccEntity>) -> Result<()> {
        let entity = event.event();
        validation::verify_mvcc_entity_optional_entity(entity)?;

        let entity_id = entity.id();
        let version = entity.version();
        let scope = event.scope();

        let committed = MvccLogEntry::new(entity_id.clone(), version, LogStage::Committed);
        let mut log_mutation = self.log_strategy.write(scope, &committed)?;

        // insert a cleared value; compaction removes it later
        let entity_mutation = self.entity_strategy.clear(scope, entity_id, version)?;

        log_mutation.merge_shallow(entity_mutation);
        log_mutation.commit("delete commit")
    }
}

impl Stage for DeleteCommit {
    fn name(&self) -> &'static str {
        "delete-commit"
    }

    fn apply(
        &self,
        event: CollectionIoEvent<MvccEntity>,
    ) -> Result<CollectionIoEvent<MvccEntity>> {
        self.commit(&event)?;
        Ok(event)
    }
}
