//! MVSTORE - Column Store Engine
//! The in-process column store backing the MVCC pipeline and the map
//! manager: sorted column families in memory, made durable by a WAL
//! that logs each submitted batch as one frame.

pub mod batch;
pub mod compaction;
pub mod concurrent;
pub mod memtable;
pub mod metrics;
pub mod ttl;
pub mod wal;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;

pub use self::batch::{Mutation, MutationBatch};
pub use self::compaction::CompactionStats;
pub use self::concurrent::Keyspace;
pub use self::memtable::{Cell, ColumnPage, ScanOrder};

use self::memtable::MemTable;
use self::wal::WriteAheadLog;

/// Column families known to the store. Each holds unrelated row layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ColumnFamily {
    /// Row per (collection scope, entity id); column per version; value is the stage.
    LogEntries,
    /// Row per (collection scope, entity id); column per version; value is the payload.
    EntityVersions,
    /// Row per (map scope, key); a single value column.
    MapEntries,
    /// Row per map scope; column per key.
    MapKeys,
}

impl ColumnFamily {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnFamily::LogEntries => "log_entries",
            ColumnFamily::EntityVersions => "entity_versions",
            ColumnFamily::MapEntries => "map_entries",
            ColumnFamily::MapKeys => "map_keys",
        }
    }
}

/// Single-threaded column store. Coordinates the MemTable and the WAL;
/// `Keyspace` wraps it for shared use.
pub struct ColumnStore {
    /// Sorted column families.
    memtable: MemTable,
    /// Write-ahead log; absent for an in-memory store.
    wal: Option<WriteAheadLog>,
    /// Batches replayed when the store was opened.
    recovered_batches: usize,
}

impl ColumnStore {
    /// Open the store described by `config`, replaying its WAL if durable.
    pub fn open(config: &Config) -> Result<Self> {
        config.ensure_dirs()?;

        let Some(wal_path) = config.wal_path() else {
            return Ok(Self::in_memory());
        };

        let recovered = WriteAheadLog::recover(&wal_path)?;
        let mut memtable = MemTable::new();
        for batch in &recovered.batches {
            Self::apply_to(&mut memtable, batch);
        }
        let wal = WriteAheadLog::open(wal_path, config.sync_writes)?;

        log::info!(
            "Column store opened at {:?} ({} batches recovered, {} checkpoint frames, {} cells)",
            wal.path(),
            recovered.batches.len(),
            recovered.checkpoint_frames,
            memtable.len()
        );

        Ok(Self {
            memtable,
            wal: Some(wal),
            recovered_batches: recovered.batches.len(),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            memtable: MemTable::new(),
            wal: None,
            recovered_batches: 0,
        }
    }

    /// Apply a batch: WAL frame first (durability), then MemTable.
    /// If the WAL write fails nothing is applied.
    pub fn apply(&mut self, mutations: &[Mutation]) -> Result<()> {
        if let Some(wal) = self.wal.as_mut() {
            wal.append_batch(mutations)?;
        }
        Self::apply_to(&mut self.memtable, mutations);
        Ok(())
    }

    fn apply_to(memtable: &mut MemTable, mutations: &[Mutation]) {
        for mutation in mutations {
            match mutation {
                Mutation::PutColumn {
                    family,
                    row,
                    column,
                    cell,
                } => memtable.put(*family, row.clone(), column.clone(), cell.clone()),
                Mutation::DeleteColumn {
                    family,
                    row,
                    column,
                } => {
                    memtable.delete_column(*family, row, column);
                }
                Mutation::DeleteRow { family, row } => {
                    memtable.delete_row(*family, row);
                }
            }
        }
    }

    pub fn get(&self, family: ColumnFamily, row: &[u8], column: &[u8]) -> Option<Cell> {
        self.memtable.get(family, row, column, ttl::now_ms()).cloned()
    }

    pub fn scan(
        &self,
        family: ColumnFamily,
        row: &[u8],
        start: Option<&[u8]>,
        limit: usize,
        order: ScanOrder,
    ) -> ColumnPage {
        self.memtable
            .scan(family, row, start, limit, order, ttl::now_ms())
    }

    /// Purge expired cells and rewrite the WAL as a checkpoint of live cells.
    pub fn compact(&mut self) -> Result<CompactionStats> {
        let expired_cells = self.memtable.purge_expired(ttl::now_ms());
        let mut stats = CompactionStats {
            expired_cells,
            live_cells: self.memtable.len(),
            checkpoint_frames: 0,
        };
        if let Some(wal) = self.wal.as_mut() {
            let chunks = compaction::checkpoint(&self.memtable, compaction::CHECKPOINT_CHUNK);
            wal.rewrite(&chunks)?;
            stats.checkpoint_frames = chunks.len();
        }
        log::info!(
            "Compaction purged {} expired cells, {} live cells remain",
            stats.expired_cells,
            stats.live_cells
        );
        Ok(stats)
    }

    pub fn recovered_batches(&self) -> usize {
        self.recovered_batches
    }

    /// Number of stored cells.
    pub fn len(&self) -> usize {
        self.memtable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memtable.is_empty()
    }

    /// Approximate MemTable size in bytes.
    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }
}
