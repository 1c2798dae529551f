//! MVSTORE - Store Context
//! Owns the keyspace and the shared serialization strategies, and hands
//! out managers bound to a scope. Pass it (or clones of it) to whatever
//! needs store access; there is no global instance.

use std::sync::Arc;

use crate::config::Config;
use crate::engine::Keyspace;
use crate::error::Result;
use crate::map::{MapManager, MapManagerFactory};
use crate::mvcc::serialization::{
    ColumnEntityStrategy, ColumnLogEntryStrategy, EntitySerializationStrategy,
    LogEntrySerializationStrategy,
};
use crate::mvcc::EntityCollectionManager;
use crate::types::{CollectionScope, MapScope};

#[derive(Clone)]
pub struct StoreContext {
    config: Config,
    keyspace: Keyspace,
    log_strategy: Arc<dyn LogEntrySerializationStrategy>,
    entity_strategy: Arc<dyn EntitySerializationStrategy>,
    maps: MapManagerFactory,
}

impl StoreContext {
    /// Open (and recover) the keyspace described by `config`.
    pub fn open(config: Config) -> Result<Self> {
        let keyspace = Keyspace::open(&config)?;
        log::info!(
            "Store opened ({})",
            match &config.data_dir {
                Some(dir) => dir.display().to_string(),
                None => "in-memory".to_string(),
            }
        );
        Ok(Self::with_keyspace(config, keyspace))
    }

    /// A context over a fresh in-memory keyspace.
    pub fn in_memory() -> Self {
        Self::with_keyspace(Config::in_memory(), Keyspace::in_memory())
    }

    fn with_keyspace(config: Config, keyspace: Keyspace) -> Self {
        Self {
            log_strategy: Arc::new(ColumnLogEntryStrategy::new(keyspace.clone())),
            entity_strategy: Arc::new(ColumnEntityStrategy::new(keyspace.clone())),
            maps: MapManagerFactory::new(keyspace.clone(), &config),
            config,
            keyspace,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    pub fn collection_manager(&self, scope: CollectionScope) -> EntityCollectionManager {
        EntityCollectionManager::new(
            scope,
            self.log_strategy.clone(),
            self.entity_strategy.clone(),
            self.config.max_entity_size,
        )
    }

    pub fn map_manager(&self, scope: MapScope) -> Result<MapManager> {
        self.maps.create_map_manager(scope)
    }
}
