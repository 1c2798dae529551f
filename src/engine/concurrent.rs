//! MVSTORE - Shared Keyspace Handle
//! Thread-safe, cloneable handle to a `ColumnStore`.
//!
//! ## Concurrency Model
//! - Reads (`get_column`, `scan_columns`) take a **read lock** (shared)
//! - Batch submission takes a **write lock** (exclusive), so a batch
//!   becomes visible all at once
//! - Every lock acquisition is bounded by the configured operation
//!   timeout; giving up surfaces as `TransportError::Timeout`
//! - A keyspace can be taken offline, after which every request fails
//!   with `TransportError::Unavailable`

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{Result, TransportError};

use super::batch::{Mutation, MutationBatch};
use super::compaction::CompactionStats;
use super::memtable::{Cell, ColumnPage, ScanOrder};
use super::metrics::KeyspaceMetrics;
use super::{ColumnFamily, ColumnStore};

struct Shared {
    store: RwLock<ColumnStore>,
    metrics: KeyspaceMetrics,
    online: AtomicBool,
    timeout: Duration,
}

/// Cloneable handle to a column store, shared by every serialization
/// strategy and manager built on it.
#[derive(Clone)]
pub struct Keyspace {
    inner: Arc<Shared>,
}

impl Keyspace {
    /// Open the keyspace described by `config`.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        let store = ColumnStore::open(config)?;
        let metrics = KeyspaceMetrics::new();
        metrics.record_recovery(store.recovered_batches());
        Ok(Self::from_store(store, metrics, config.operation_timeout))
    }

    /// A fresh in-memory keyspace with default settings.
    pub fn in_memory() -> Self {
        Self::from_store(
            ColumnStore::in_memory(),
            KeyspaceMetrics::new(),
            Config::default().operation_timeout,
        )
    }

    fn from_store(store: ColumnStore, metrics: KeyspaceMetrics, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Shared {
                store: RwLock::new(store),
                metrics,
                online: AtomicBool::new(true),
                timeout,
            }),
        }
    }

    /// Start an empty batch bound to this keyspace.
    pub fn prepare_batch(&self) -> MutationBatch {
        MutationBatch::new(self.clone())
    }

    fn check_online(&self) -> std::result::Result<(), TransportError> {
        if self.inner.online.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(TransportError::Unavailable)
        }
    }

    /// Apply a batch atomically (write lock).
    pub(crate) fn submit(&self, mutations: &[Mutation]) -> std::result::Result<(), TransportError> {
        let outcome = self.check_online().and_then(|()| {
            let mut store = self
                .inner
                .store
                .try_write_for(self.inner.timeout)
                .ok_or_else(|| {
                    self.inner.metrics.record_timeout();
                    TransportError::Timeout(self.inner.timeout)
                })?;
            store
                .apply(mutations)
                .map_err(|e| TransportError::Wal(e.to_string()))
        });

        match &outcome {
            Ok(()) => {
                let bytes = mutations.iter().map(Mutation::written_bytes).sum();
                self.inner.metrics.record_batch(mutations.len(), bytes);
            }
            Err(_) => self.inner.metrics.record_failed_submission(),
        }
        outcome
    }

    /// Read one live column (read lock).
    pub fn get_column(
        &self,
        family: ColumnFamily,
        row: &[u8],
        column: &[u8],
    ) -> std::result::Result<Option<Cell>, TransportError> {
        self.check_online()?;
        let store = self.read_store()?;
        self.inner.metrics.record_read();
        Ok(store.get(family, row, column))
    }

    /// Scan a page of live columns from one row (read lock).
    pub fn scan_columns(
        &self,
        family: ColumnFamily,
        row: &[u8],
        start: Option<&[u8]>,
        limit: usize,
        order: ScanOrder,
    ) -> std::result::Result<ColumnPage, TransportError> {
        self.check_online()?;
        let store = self.read_store()?;
        self.inner.metrics.record_scan();
        Ok(store.scan(family, row, start, limit, order))
    }

    fn read_store(
        &self,
    ) -> std::result::Result<parking_lot::RwLockReadGuard<'_, ColumnStore>, TransportError> {
        self.inner
            .store
            .try_read_for(self.inner.timeout)
            .ok_or_else(|| {
                self.inner.metrics.record_timeout();
                TransportError::Timeout(self.inner.timeout)
            })
    }

    /// Purge expired cells and checkpoint the WAL (write lock).
    pub fn compact(&self) -> Result<CompactionStats> {
        self.check_online()?;
        let mut store = self
            .inner
            .store
            .try_write_for(self.inner.timeout)
            .ok_or(TransportError::Timeout(self.inner.timeout))?;
        let stats = store.compact()?;
        self.inner.metrics.record_compaction();
        Ok(stats)
    }

    /// Take the keyspace offline (`false`) or bring it back.
    pub fn set_online(&self, online: bool) {
        self.inner.online.store(online, Ordering::Release);
        log::info!("Keyspace {}", if online { "online" } else { "offline" });
    }

    /// Number of stored cells, expired ones included until compaction.
    pub fn cell_count(&self) -> std::result::Result<usize, TransportError> {
        Ok(self.read_store()?.len())
    }

    /// Approximate MemTable size in bytes.
    pub fn memtable_size(&self) -> std::result::Result<usize, TransportError> {
        Ok(self.read_store()?.memtable_size())
    }

    pub fn metrics(&self) -> &KeyspaceMetrics {
        &self.inner.metrics
    }
}
