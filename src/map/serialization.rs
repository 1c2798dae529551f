//! Column layout of a scoped map.
//!
//! Two families back every map:
//! - `MapEntries`: row `(scope, key)`, single column `value` holding a `MapValue`
//! - `MapKeys`: row `scope`, one empty column per key (the enumeration index)

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec;
use crate::engine::{ColumnFamily, Keyspace, MutationBatch, ScanOrder};
use crate::error::{Result, StoreError};
use crate::types::MapScope;

const VALUE_COLUMN: &[u8] = b"value";

/// A typed map value as stored in the entries family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapValue {
    Str(String),
    Long(i64),
    Uuid(Uuid),
}

impl MapValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            MapValue::Str(_) => "string",
            MapValue::Long(_) => "long",
            MapValue::Uuid(_) => "uuid",
        }
    }

    pub(crate) fn into_string(self) -> Result<String> {
        match self {
            MapValue::Str(value) => Ok(value),
            other => Err(wrong_type("string", &other)),
        }
    }

    pub(crate) fn into_long(self) -> Result<i64> {
        match self {
            MapValue::Long(value) => Ok(value),
            other => Err(wrong_type("long", &other)),
        }
    }

    pub(crate) fn into_uuid(self) -> Result<Uuid> {
        match self {
            MapValue::Uuid(value) => Ok(value),
            other => Err(wrong_type("uuid", &other)),
        }
    }
}

fn wrong_type(expected: &str, found: &MapValue) -> StoreError {
    StoreError::Serialization(format!(
        "expected {} map value, found {}",
        expected,
        found.type_name()
    ))
}

/// Reads and builds mutations for one map's rows.
pub(crate) struct MapSerialization {
    keyspace: Keyspace,
    scope: MapScope,
    index_row: Vec<u8>,
}

impl MapSerialization {
    pub fn new(keyspace: Keyspace, scope: MapScope) -> Result<Self> {
        let index_row = codec::encode(&scope)?;
        Ok(Self {
            keyspace,
            scope,
            index_row,
        })
    }

    fn entry_row(&self, key: &str) -> Result<Vec<u8>> {
        codec::encode(&(&self.scope, key))
    }

    /// Entry and index column for `key`, both expiring after `ttl` if given.
    pub fn put(&self, key: &str, value: &MapValue, ttl: Option<Duration>) -> Result<MutationBatch> {
        let mut batch = self.keyspace.prepare_batch();
        batch
            .put_column(
                ColumnFamily::MapEntries,
                self.entry_row(key)?,
                VALUE_COLUMN.to_vec(),
                codec::encode(value)?,
                ttl,
            )
            .put_column(
                ColumnFamily::MapKeys,
                self.index_row.clone(),
                key.as_bytes().to_vec(),
                Vec::new(),
                ttl,
            );
        Ok(batch)
    }

    pub fn delete(&self, key: &str) -> Result<MutationBatch> {
        let mut batch = self.keyspace.prepare_batch();
        batch
            .delete_row(ColumnFamily::MapEntries, self.entry_row(key)?)
            .delete_column(
                ColumnFamily::MapKeys,
                self.index_row.clone(),
                key.as_bytes().to_vec(),
            );
        Ok(batch)
    }

    pub fn get(&self, key: &str) -> Result<Option<MapValue>> {
        let cell = self
            .keyspace
            .get_column(ColumnFamily::MapEntries, &self.entry_row(key)?, VALUE_COLUMN)?;
        cell.map(|cell| codec::decode(&cell.value, "map value"))
            .transpose()
    }

    /// Up to `limit` keys strictly after `after`, and whether the index may hold more.
    pub fn keys(&self, after: Option<&str>, limit: usize) -> Result<(Vec<String>, bool)> {
        let page = self.keyspace.scan_columns(
            ColumnFamily::MapKeys,
            &self.index_row,
            after.map(str::as_bytes),
            limit,
            ScanOrder::Ascending,
        )?;

        let keys = page
            .columns
            .into_iter()
            .map(|(column, _)| {
                String::from_utf8(column)
                    .map_err(|e| StoreError::Corruption(format!("map key is not utf-8: {}", e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((keys, page.has_more))
    }
}
