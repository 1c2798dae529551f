//! MVSTORE - MemTable (In-Memory Column Families)
//! Holds every column family as sorted rows of sorted columns.
//! All batches land here after they are made durable in the WAL.

use std::collections::BTreeMap;
use std::ops::Bound;

use serde::{Deserialize, Serialize};

use super::ttl;
use super::ColumnFamily;

/// Row key within a column family.
pub type RowKey = Vec<u8>;

/// Column name within a row. Columns sort by raw bytes.
pub type ColumnName = Vec<u8>;

type Row = BTreeMap<ColumnName, Cell>;

/// A stored column value with an optional absolute expiration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub value: Vec<u8>,
    pub expires_at_ms: Option<u64>,
}

impl Cell {
    pub fn new(value: Vec<u8>) -> Self {
        Self {
            value,
            expires_at_ms: None,
        }
    }

    pub fn expiring(value: Vec<u8>, expires_at_ms: u64) -> Self {
        Self {
            value,
            expires_at_ms: Some(expires_at_ms),
        }
    }

    pub fn is_live(&self, now_ms: u64) -> bool {
        !ttl::is_expired(self.expires_at_ms, now_ms)
    }
}

/// Direction of a column scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    Ascending,
    Descending,
}

/// One page of a column scan.
#[derive(Debug, Clone, Default)]
pub struct ColumnPage {
    /// Live columns in scan order.
    pub columns: Vec<(ColumnName, Cell)>,
    /// The scan stopped at the limit with further columns in the row.
    /// Those columns may turn out to be expired, so a following page can be empty.
    pub has_more: bool,
}

/// Sorted in-memory storage for all column families.
pub struct MemTable {
    families: BTreeMap<ColumnFamily, BTreeMap<RowKey, Row>>,
    /// Number of stored cells, expired ones included until purged.
    cells: usize,
    /// Approximate size in bytes.
    size_bytes: usize,
}

impl MemTable {
    /// Create a new, empty MemTable.
    pub fn new() -> Self {
        Self {
            families: BTreeMap::new(),
            cells: 0,
            size_bytes: 0,
        }
    }

    /// Returns the approximate size of the MemTable in bytes.
    pub fn size(&self) -> usize {
        self.size_bytes
    }

    /// Returns the number of stored cells.
    pub fn len(&self) -> usize {
        self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells == 0
    }

    /// Insert or replace a column.
    pub fn put(&mut self, family: ColumnFamily, row: RowKey, column: ColumnName, cell: Cell) {
        let column_len = column.len();
        let value_len = cell.value.len();
        let row_map = self
            .families
            .entry(family)
            .or_default()
            .entry(row)
            .or_default();
        match row_map.insert(column, cell) {
            // column name is already counted
            Some(old) => {
                self.size_bytes = self.size_bytes.saturating_sub(old.value.len()) + value_len;
            }
            None => {
                self.cells += 1;
                self.size_bytes += column_len + value_len;
            }
        }
    }

    /// Get a live column. Expired cells read as absent.
    pub fn get(
        &self,
        family: ColumnFamily,
        row: &[u8],
        column: &[u8],
        now_ms: u64,
    ) -> Option<&Cell> {
        self.families
            .get(&family)?
            .get(row)?
            .get(column)
            .filter(|cell| cell.is_live(now_ms))
    }

    /// Remove a single column. Returns true if it existed.
    pub fn delete_column(&mut self, family: ColumnFamily, row: &[u8], column: &[u8]) -> bool {
        let Some(rows) = self.families.get_mut(&family) else {
            return false;
        };
        let Some(row_map) = rows.get_mut(row) else {
            return false;
        };
        let removed = match row_map.remove(column) {
            Some(cell) => {
                self.cells -= 1;
                self.size_bytes = self
                    .size_bytes
                    .saturating_sub(column.len() + cell.value.len());
                true
            }
            None => false,
        };
        if row_map.is_empty() {
            rows.remove(row);
        }
        removed
    }

    /// Remove a whole row. Returns the number of cells removed.
    pub fn delete_row(&mut self, family: ColumnFamily, row: &[u8]) -> usize {
        let Some(row_map) = self.families.get_mut(&family).and_then(|rows| rows.remove(row))
        else {
            return 0;
        };
        let freed: usize = row_map
            .iter()
            .map(|(column, cell)| column.len() + cell.value.len())
            .sum();
        self.cells -= row_map.len();
        self.size_bytes = self.size_bytes.saturating_sub(freed);
        row_map.len()
    }

    /// Scan up to `limit` live columns of a row, strictly after `start`
    /// (strictly before it when descending).
    pub fn scan(
        &self,
        family: ColumnFamily,
        row: &[u8],
        start: Option<&[u8]>,
        limit: usize,
        order: ScanOrder,
        now_ms: u64,
    ) -> ColumnPage {
        let Some(row_map) = self.families.get(&family).and_then(|rows| rows.get(row)) else {
            return ColumnPage::default();
        };

        let after = start.map_or(Bound::Unbounded, Bound::Excluded);
        let iter: Box<dyn Iterator<Item = (&ColumnName, &Cell)> + '_> = match order {
            ScanOrder::Ascending => {
                Box::new(row_map.range::<[u8], _>((after, Bound::Unbounded)))
            }
            ScanOrder::Descending => {
                Box::new(row_map.range::<[u8], _>((Bound::Unbounded, after)).rev())
            }
        };

        let mut page = ColumnPage::default();
        for (column, cell) in iter {
            if page.columns.len() == limit {
                page.has_more = true;
                break;
            }
            if cell.is_live(now_ms) {
                page.columns.push((column.clone(), cell.clone()));
            }
        }
        page
    }

    /// Drop every expired cell and any row left empty.
    /// Returns the number of cells purged.
    pub fn purge_expired(&mut self, now_ms: u64) -> usize {
        let mut purged = 0;
        let mut freed = 0;
        for rows in self.families.values_mut() {
            rows.retain(|_, row_map| {
                row_map.retain(|column, cell| {
                    if cell.is_live(now_ms) {
                        true
                    } else {
                        purged += 1;
                        freed += column.len() + cell.value.len();
                        false
                    }
                });
                !row_map.is_empty()
            });
        }
        self.families.retain(|_, rows| !rows.is_empty());
        self.cells -= purged;
        self.size_bytes = self.size_bytes.saturating_sub(freed);
        purged
    }

    /// Iterate every stored cell in family, row, column order.
    pub fn cells(&self) -> impl Iterator<Item = (ColumnFamily, &RowKey, &ColumnName, &Cell)> {
        self.families.iter().flat_map(|(family, rows)| {
            rows.iter().flat_map(move |(row, row_map)| {
                row_map
                    .iter()
                    .map(move |(column, cell)| (*family, row, column, cell))
            })
        })
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
