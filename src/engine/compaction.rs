//! MVSTORE - Compaction
//! Reclaims space held by expired cells and shrinks the WAL.
//!
//! Deletes are applied physically to the MemTable, so the only dead data
//! in memory is expired cells. On disk the WAL keeps every batch ever
//! written; compaction replaces it with checkpoint frames holding just the
//! live cells.

use super::batch::Mutation;
use super::memtable::MemTable;

/// Mutations per checkpoint frame.
pub const CHECKPOINT_CHUNK: usize = 1024;

/// Outcome of a compaction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompactionStats {
    /// Expired cells removed from memory.
    pub expired_cells: usize,
    /// Cells still live after the run.
    pub live_cells: usize,
    /// Checkpoint frames written to the WAL (0 for an in-memory keyspace).
    pub checkpoint_frames: usize,
}

/// Re-express the MemTable's cells as put mutations, `chunk` per batch.
pub fn checkpoint(memtable: &MemTable, chunk: usize) -> Vec<Vec<Mutation>> {
    let chunk = chunk.max(1);
    let mut batches = Vec::new();
    let mut current = Vec::with_capacity(chunk.min(memtable.len()));

    for (family, row, column, cell) in memtable.cells() {
        current.push(Mutation::PutColumn {
            family,
            row: row.clone(),
            column: column.clone(),
            cell: cell.clone(),
        });
        if current.len() == chunk {
            batches.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
