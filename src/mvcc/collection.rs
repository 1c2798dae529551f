//! Entry points for writing, deleting and loading entities in one collection.

use std::sync::Arc;

use crate::error::{Result, StoreError};
use crate::model::Entity;
use crate::types::{CollectionScope, Id, VersionStamp};

use super::entity::{MvccEntity, MvccLogEntry, Payload};
use super::serialization::{EntitySerializationStrategy, LogEntrySerializationStrategy};
use super::stage::delete::{DeleteCommit, DeleteStart};
use super::stage::write::{WriteCommit, WriteStart, WriteVerify};
use super::stage::{CollectionIoEvent, Pipeline};
use super::validation;

/// Log entries fetched per page while `load` looks for the newest committed version.
const LOAD_PAGE: usize = 100;

/// Writes, deletes and reads entities of one collection scope.
pub struct EntityCollectionManager {
    scope: CollectionScope,
    log_strategy: Arc<dyn LogEntrySerializationStrategy>,
    entity_strategy: Arc<dyn EntitySerializationStrategy>,
    write_pipeline: Pipeline,
    delete_pipeline: Pipeline,
}

impl EntityCollectionManager {
    pub fn new(
        scope: CollectionScope,
        log_strategy: Arc<dyn LogEntrySerializationStrategy>,
        entity_strategy: Arc<dyn EntitySerializationStrategy>,
        max_entity_size: usize,
    ) -> Self {
        let write_pipeline = Pipeline::new("write")
            .with_stage(WriteVerify::new(max_entity_size))
            .with_stage(WriteStart::new(log_strategy.clone()))
            .with_stage(WriteCommit::new(
                log_strategy.clone(),
                entity_strategy.clone(),
            ));
        let delete_pipeline = Pipeline::new("delete")
            .with_stage(DeleteStart::new(log_strategy.clone()))
            .with_stage(DeleteCommit::new(
                log_strategy.clone(),
                entity_strategy.clone(),
            ));

        Self {
            scope,
            log_strategy,
            entity_strategy,
            write_pipeline,
            delete_pipeline,
        }
    }

    pub fn scope(&self) -> &CollectionScope {
        &self.scope
    }

    /// Write a new version of `entity`. Returns the entity carrying its version.
    ///
    /// The payload is verified before anything is logged, so a rejected
    /// entity leaves no trace in the store.
    pub fn write(&self, mut entity: Entity) -> Result<Entity> {
        validation::verify_identity(entity.id())?;
        let stamp = VersionStamp::new();
        // stamped up front so the size check sees the stored form
        entity.set_version(stamp);
        let version = MvccEntity::new(entity.id().clone(), stamp, Payload::Present(entity));
        let event = CollectionIoEvent::new(self.scope.clone(), version);

        let written = self.write_pipeline.run(event)?.into_event();
        match written.into_payload() {
            Payload::Present(entity) => Ok(entity),
            _ => Err(StoreError::validation("write finished without a payload")),
        }
    }

    /// Delete the entity by committing a new, cleared version.
    pub fn delete(&self, id: &Id) -> Result<()> {
        validation::verify_identity(id)?;
        let version = MvccEntity::new(id.clone(), VersionStamp::new(), Payload::Pending);
        self.delete_pipeline
            .run(CollectionIoEvent::new(self.scope.clone(), version))?;
        Ok(())
    }

    /// The newest committed, non-cleared version of the entity.
    ///
    /// Versions still `Active` are skipped. A newest committed version that
    /// was cleared means the entity is deleted.
    pub fn load(&self, id: &Id) -> Result<Option<Entity>> {
        validation::verify_identity(id)?;
        let mut before = None;
        loop {
            let page = self
                .log_strategy
                .load_history(&self.scope, id, before, LOAD_PAGE)?;

            for entry in page.iter().filter(|entry| entry.stage().is_committed()) {
                let Some(version) = self
                    .entity_strategy
                    .load(&self.scope, id, entry.version())?
                else {
                    continue;
                };
                return Ok(match version.into_payload() {
                    Payload::Present(entity) => Some(entity),
                    _ => None,
                });
            }

            match page.last() {
                Some(oldest) if page.len() == LOAD_PAGE => before = Some(oldest.version()),
                _ => return Ok(None),
            }
        }
    }

    /// A specific version, only once its log entry is committed.
    pub fn load_version(&self, id: &Id, version: VersionStamp) -> Result<Option<MvccEntity>> {
        validation::verify_identity(id)?;
        validation::verify_version(version)?;
        match self.log_strategy.load(&self.scope, id, version)? {
            Some(entry) if entry.stage().is_committed() => {
                self.entity_strategy.load(&self.scope, id, version)
            }
            _ => Ok(None),
        }
    }

    /// Up to `limit` log entries, newest first.
    pub fn history(&self, id: &Id, limit: usize) -> Result<Vec<MvccLogEntry>> {
        validation::verify_identity(id)?;
        self.log_strategy.load_history(&self.scope, id, None, limit)
    }

    pub fn write_stages(&self) -> Vec<&'static str> {
        self.write_pipeline.stage_names()
    }

    pub fn delete_stages(&self) -> Vec<&'static str> {
        self.delete_pipeline.stage_names()
    }
}
