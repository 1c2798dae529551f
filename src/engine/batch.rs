//! MVSTORE - Mutation Batches
//! Pending mutations are collected into a batch by whichever
//! collaborator builds them, merged with other batches, and submitted
//! to the keyspace as one unit.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, TransportError};

use super::concurrent::Keyspace;
use super::memtable::{Cell, ColumnName, RowKey};
use super::{ttl, ColumnFamily};

/// A single pending change to the keyspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    PutColumn {
        family: ColumnFamily,
        row: RowKey,
        column: ColumnName,
        cell: Cell,
    },
    DeleteColumn {
        family: ColumnFamily,
        row: RowKey,
        column: ColumnName,
    },
    DeleteRow {
        family: ColumnFamily,
        row: RowKey,
    },
}

impl Mutation {
    /// Approximate number of bytes this mutation writes.
    pub fn written_bytes(&self) -> usize {
        match self {
            Mutation::PutColumn { row, column, cell, .. } => {
                row.len() + column.len() + cell.value.len()
            }
            Mutation::DeleteColumn { row, column, .. } => row.len() + column.len(),
            Mutation::DeleteRow { row, .. } => row.len(),
        }
    }
}

/// An ordered set of pending mutations bound to the keyspace that will execute them.
///
/// Mutations apply in insertion order, so a batch that writes a log entry
/// before clearing a payload is observed in that order by recovery too.
pub struct MutationBatch {
    keyspace: Keyspace,
    mutations: Vec<Mutation>,
}

impl fmt::Debug for MutationBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationBatch")
            .field("mutations", &self.mutations)
            .finish()
    }
}

impl MutationBatch {
    pub(crate) fn new(keyspace: Keyspace) -> Self {
        Self {
            keyspace,
            mutations: Vec::new(),
        }
    }

    /// Write a column. With a `ttl` the cell expires that long after now.
    pub fn put_column(
        &mut self,
        family: ColumnFamily,
        row: RowKey,
        column: ColumnName,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> &mut Self {
        let cell = match ttl {
            Some(duration) => Cell::expiring(value, ttl::expires_at(duration)),
            None => Cell::new(value),
        };
        self.mutations.push(Mutation::PutColumn {
            family,
            row,
            column,
            cell,
        });
        self
    }

    pub fn delete_column(
        &mut self,
        family: ColumnFamily,
        row: RowKey,
        column: ColumnName,
    ) -> &mut Self {
        self.mutations.push(Mutation::DeleteColumn {
            family,
            row,
            column,
        });
        self
    }

    pub fn delete_row(&mut self, family: ColumnFamily, row: RowKey) -> &mut Self {
        self.mutations.push(Mutation::DeleteRow { family, row });
        self
    }

    /// Append the other batch's mutations after this batch's own.
    pub fn merge_shallow(&mut self, other: MutationBatch) -> &mut Self {
        self.mutations.extend(other.mutations);
        self
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Submit the batch in a single round trip. Not retried.
    pub fn execute(self) -> std::result::Result<(), TransportError> {
        if self.mutations.is_empty() {
            return Ok(());
        }
        self.keyspace.submit(&self.mutations)
    }

    /// Submit once; a transport failure is logged and wrapped in `CommitFailure`.
    pub fn commit(self, what: &str) -> crate::error::Result<()> {
        self.execute().map_err(|e| {
            log::error!("Failed to execute {}: {}", what, e);
            StoreError::commit_failure(format!("Failed to execute {}", what), e)
        })
    }
}
