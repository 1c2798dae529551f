//! MVSTORE - Store Configuration
//! Defines tunable parameters for the keyspace, the MVCC pipeline
//! and the map manager.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, StoreError};

/// Largest column name the keyspace accepts (map keys are column names).
pub const MAX_COLUMN_NAME_LEN: usize = u16::MAX as usize;

/// Configuration for the store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for the write-ahead log. `None` keeps the keyspace in memory only.
    pub data_dir: Option<PathBuf>,

    /// Whether to fsync every WAL frame before acknowledging a batch.
    pub sync_writes: bool,

    /// Upper bound on how long a read or batch submission may wait for the keyspace.
    pub operation_timeout: Duration,

    /// Maximum encoded size of a single entity payload in bytes.
    pub max_entity_size: usize,

    /// Maximum length of a map key in bytes.
    pub max_key_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            sync_writes: true,
            operation_timeout: Duration::from_secs(5),
            max_entity_size: 1024 * 1024, // 1 MB
            max_key_len: MAX_COLUMN_NAME_LEN,
        }
    }
}

impl Config {
    /// Create a durable Config writing its log under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Default::default()
        }
    }

    /// Create a Config for a purely in-memory keyspace.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn with_max_entity_size(mut self, size: usize) -> Self {
        self.max_entity_size = size;
        self
    }

    pub fn with_max_key_len(mut self, len: usize) -> Self {
        self.max_key_len = len;
        self
    }

    /// Reject settings the store cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.operation_timeout.is_zero() {
            return Err(StoreError::Config("operation_timeout must be non-zero".into()));
        }
        if self.max_entity_size == 0 {
            return Err(StoreError::Config("max_entity_size must be non-zero".into()));
        }
        if self.max_key_len == 0 || self.max_key_len > MAX_COLUMN_NAME_LEN {
            return Err(StoreError::Config(format!(
                "max_key_len must be between 1 and {}",
                MAX_COLUMN_NAME_LEN
            )));
        }
        Ok(())
    }

    /// Ensure the data directory exists, if there is one.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        match &self.data_dir {
            Some(dir) => std::fs::create_dir_all(dir),
            None => Ok(()),
        }
    }

    /// Path of the write-ahead log, if the keyspace is durable.
    pub fn wal_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("mvstore.wal"))
    }
}
