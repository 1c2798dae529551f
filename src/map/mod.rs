//! MVSTORE - Map Manager
//! Scoped key/value maps with typed values, per-entry TTL and
//! cursor-paginated key enumeration.
//!
//! ## Semantics
//! - Keys are non-empty UTF-8 strings no longer than `Config::max_key_len`
//! - An expired entry reads exactly like one never written
//! - Deletes are hard and immediate; deleting a missing key is a no-op
//! - `get_keys` walks keys in ascending byte order, strictly after the cursor

mod cursor;
mod serialization;

pub use self::serialization::MapValue;

use std::collections::HashMap;
use std::time::Duration;

use uuid::Uuid;

use crate::config::Config;
use crate::engine::Keyspace;
use crate::error::{Result, StoreError};
use crate::types::MapScope;

use self::cursor::MapCursor;
use self::serialization::MapSerialization;

/// One page of keys plus the cursor to fetch the next one, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MapKeyResults {
    pub keys: Vec<String>,
    pub cursor: Option<String>,
}

impl MapKeyResults {
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }
}

/// Creates map managers bound to one keyspace.
#[derive(Clone)]
pub struct MapManagerFactory {
    keyspace: Keyspace,
    max_key_len: usize,
}

impl MapManagerFactory {
    pub fn new(keyspace: Keyspace, config: &Config) -> Self {
        Self {
            keyspace,
            max_key_len: config.max_key_len,
        }
    }

    pub fn create_map_manager(&self, scope: MapScope) -> Result<MapManager> {
        MapManager::new(self.keyspace.clone(), scope, self.max_key_len)
    }
}

/// Key/value operations on a single `MapScope`.
pub struct MapManager {
    scope: MapScope,
    serialization: MapSerialization,
    max_key_len: usize,
}

impl MapManager {
    pub fn new(keyspace: Keyspace, scope: MapScope, max_key_len: usize) -> Result<Self> {
        let serialization = MapSerialization::new(keyspace, scope.clone())?;
        Ok(Self {
            scope,
            serialization,
            max_key_len,
        })
    }

    pub fn scope(&self) -> &MapScope {
        &self.scope
    }

    pub fn put_string(&self, key: &str, value: &str) -> Result<()> {
        self.put(key, MapValue::Str(value.to_owned()), None)
    }

    pub fn put_string_with_ttl(&self, key: &str, value: &str, ttl_secs: u32) -> Result<()> {
        self.put(key, MapValue::Str(value.to_owned()), Some(ttl(ttl_secs)?))
    }

    pub fn put_long(&self, key: &str, value: i64) -> Result<()> {
        self.put(key, MapValue::Long(value), None)
    }

    pub fn put_long_with_ttl(&self, key: &str, value: i64, ttl_secs: u32) -> Result<()> {
        self.put(key, MapValue::Long(value), Some(ttl(ttl_secs)?))
    }

    pub fn put_uuid(&self, key: &str, value: Uuid) -> Result<()> {
        self.put(key, MapValue::Uuid(value), None)
    }

    pub fn put_uuid_with_ttl(&self, key: &str, value: Uuid, ttl_secs: u32) -> Result<()> {
        self.put(key, MapValue::Uuid(value), Some(ttl(ttl_secs)?))
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.get(key)?.map(MapValue::into_string).transpose()
    }

    pub fn get_long(&self, key: &str) -> Result<Option<i64>> {
        self.get(key)?.map(MapValue::into_long).transpose()
    }

    pub fn get_uuid(&self, key: &str) -> Result<Option<Uuid>> {
        self.get(key)?.map(MapValue::into_uuid).transpose()
    }

    /// Every present key among `keys` with its string value. Missing keys are omitted.
    pub fn get_strings<I, K>(&self, keys: I) -> Result<HashMap<String, String>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut found = HashMap::new();
        for key in keys {
            let key = key.as_ref();
            if let Some(value) = self.get_string(key)? {
                found.insert(key.to_owned(), value);
            }
        }
        Ok(found)
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.validate_key(key)?;
        self.serialization.delete(key)?.commit("map delete")
    }

    /// Up to `limit` keys after `cursor` in ascending order.
    ///
    /// A cursor comes back only when the page is full and the store may
    /// hold more keys; callers loop until it is absent.
    pub fn get_keys(&self, cursor: Option<&str>, limit: usize) -> Result<MapKeyResults> {
        if limit == 0 {
            return Err(StoreError::validation("limit must be at least 1"));
        }
        let after = cursor.map(MapCursor::decode).transpose()?;

        let (keys, has_more) = self
            .serialization
            .keys(after.as_ref().map(|c| c.last_key.as_str()), limit)?;

        let cursor = match keys.last() {
            Some(last) if keys.len() == limit && has_more => Some(MapCursor::new(last.as_str()).encode()?),
            _ => None,
        };
        Ok(MapKeyResults { keys, cursor })
    }

    fn put(&self, key: &str, value: MapValue, ttl: Option<Duration>) -> Result<()> {
        self.validate_key(key)?;
        self.serialization.put(key, &value, ttl)?.commit("map put")
    }

    fn get(&self, key: &str) -> Result<Option<MapValue>> {
        self.validate_key(key)?;
        self.serialization.get(key)
    }

    fn validate_key(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(StoreError::validation("map key must not be empty"));
        }
        if key.len() > self.max_key_len {
            return Err(StoreError::validation(format!(
                "map key is {} bytes, limit is {}",
                key.len(),
                self.max_key_len
            )));
        }
        Ok(())
    }
}

fn ttl(ttl_secs: u32) -> Result<Duration> {
    if ttl_secs == 0 {
        return Err(StoreError::validation("ttl must be at least one second"));
    }
    Ok(Duration::from_secs(u64::from(ttl_secs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::types::Id;

    fn manager(keyspace: &Keyspace) -> MapManager {
        MapManager::new(
            keyspace.clone(),
            MapScope::new(Id::new("application"), "testMap"),
            16,
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_keys_fail_before_io() {
        let keyspace = Keyspace::in_memory();
        let map = manager(&keyspace);

        assert!(map.put_string("", "value").unwrap_err().is_validation());
        assert!(map
            .put_long(&"k".repeat(17), 1)
            .unwrap_err()
            .is_validation());
        assert!(map.get_string("").unwrap_err().is_validation());
        assert!(map.delete("").unwrap_err().is_validation());

        assert_eq!(keyspace.metrics().batch_count(), 0);
        assert_eq!(keyspace.cell_count().unwrap(), 0);
    }

    #[test]
    fn test_zero_ttl_and_limit_rejected() {
        let map = manager(&Keyspace::in_memory());
        assert!(map
            .put_string_with_ttl("key", "value", 0)
            .unwrap_err()
            .is_validation());
        assert!(map.get_keys(None, 0).unwrap_err().is_validation());
        assert!(map
            .get_keys(Some("%%%"), 10)
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_put_overwrites_value_type() {
        let map = manager(&Keyspace::in_memory());
        map.put_string("key", "value").unwrap();
        map.put_long("key", 9).unwrap();

        assert_eq!(map.get_long("key").unwrap(), Some(9));
        assert!(matches!(
            map.get_string("key").unwrap_err(),
            StoreError::Serialization(_)
        ));
        assert_eq!(map.get_keys(None, 10).unwrap().keys, vec!["key".to_string()]);
    }

    #[test]
    fn test_no_cursor_on_short_or_exact_final_page() {
        let map = manager(&Keyspace::in_memory());
        for key in ["a", "b", "c"] {
            map.put_string(key, "v").unwrap();
        }

        let short = map.get_keys(None, 5).unwrap();
        assert_eq!(short.keys.len(), 3);
        assert!(short.cursor.is_none());

        let exact = map.get_keys(None, 3).unwrap();
        assert_eq!(exact.keys.len(), 3);
        assert!(exact.cursor.is_none());

        let first = map.get_keys(None, 2).unwrap();
        assert_eq!(first.keys, vec!["a".to_string(), "b".to_string()]);
        let rest = map.get_keys(first.cursor(), 2).unwrap();
        assert_eq!(rest.keys, vec!["c".to_string()]);
        assert!(rest.cursor.is_none());
    }

    #[test]
    fn test_put_failure_is_commit_failure() {
        let keyspace = Keyspace::in_memory();
        let map = manager(&keyspace);
        keyspace.set_online(false);

        match map.put_string("key", "value").unwrap_err() {
            StoreError::CommitFailure { source, .. } => {
                assert!(matches!(source, TransportError::Unavailable))
            }
            other => panic!("expected CommitFailure, got {:?}", other),
        }
        assert!(matches!(
            map.get_string("key").unwrap_err(),
            StoreError::Transport(TransportError::Unavailable)
        ));
    }
}
