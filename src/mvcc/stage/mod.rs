//! MVCC stage pipeline.
//!
//! A write or delete is an explicit, ordered list of stages. Each stage
//! takes the `(scope, version)` event, does its validation or I/O, and
//! hands the (possibly transformed) event to the next stage. The first
//! failure aborts the call; there is no partial-success value.

pub mod delete;
pub mod write;

use crate::error::Result;
use crate::types::CollectionScope;

use super::entity::MvccEntity;

/// An event bound to the collection scope it operates in.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionIoEvent<T> {
    scope: CollectionScope,
    event: T,
}

impl<T> CollectionIoEvent<T> {
    pub fn new(scope: CollectionScope, event: T) -> Self {
        Self { scope, event }
    }

    pub fn scope(&self) -> &CollectionScope {
        &self.scope
    }

    pub fn event(&self) -> &T {
        &self.event
    }

    pub fn into_event(self) -> T {
        self.event
    }

    pub(crate) fn event_mut(&mut self) -> &mut T {
        &mut self.event
    }
}

/// One step of a write or delete.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        event: CollectionIoEvent<MvccEntity>,
    ) -> Result<CollectionIoEvent<MvccEntity>>;
}

/// Stages run strictly in order for a single call.
pub struct Pipeline {
    name: &'static str,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            stages: Vec::new(),
        }
    }

    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn run(
        &self,
        mut event: CollectionIoEvent<MvccEntity>,
    ) -> Result<CollectionIoEvent<MvccEntity>> {
        for stage in &self.stages {
            log::debug!(
                "{} pipeline: {} for {} version {}",
                self.name,
                stage.name(),
                event.event().id(),
                event.event().version()
            );
            event = stage.apply(event)?;
        }
        Ok(event)
    }
}
