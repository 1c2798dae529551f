//! MVSTORE - Map Manager Tests
//! Typed put/get, TTL expiry, deletes and cursor pagination against
//! an in-memory store.

use std::thread;
use std::time::{Duration, Instant};

use mvstore::context::StoreContext;
use mvstore::map::MapManager;
use mvstore::types::{Id, MapScope};
use mvstore::StoreError;
use uuid::Uuid;

fn map_manager(context: &StoreContext) -> MapManager {
    context
        .map_manager(MapScope::new(Id::new("application"), "testMap"))
        .unwrap()
}

fn put_six(map: &MapManager) {
    for i in 1..=6 {
        map.put_string(&format!("key{}", i), "value").unwrap();
    }
}

#[test]
fn write_read_string() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);

    map.put_string("key", "value").unwrap();

    assert_eq!(map.get_string("key").unwrap(), Some("value".to_string()));
}

#[test]
fn write_read_long() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);

    map.put_long("key", 1234).unwrap();

    assert_eq!(map.get_long("key").unwrap(), Some(1234));
}

#[test]
fn write_read_uuid() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);
    let value = Uuid::new_v4();

    map.put_uuid("key", value).unwrap();

    assert_eq!(map.get_uuid("key").unwrap(), Some(value));
}

#[test]
fn read_missing_entry() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);

    assert_eq!(map.get_string("key").unwrap(), None);
    assert_eq!(map.get_long("key").unwrap(), None);
    assert_eq!(map.get_uuid("key").unwrap(), None);
}

#[test]
fn write_read_string_with_long_key() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);
    let key = format!("key{}", "1234567890".repeat(25));

    map.put_string(&key, "value").unwrap();

    assert_eq!(map.get_string(&key).unwrap(), Some("value".to_string()));
    assert_eq!(map.get_keys(None, 5).unwrap().keys, vec![key]);
}

#[test]
fn key_over_limit_is_rejected_before_io() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);
    let key = "k".repeat(context.config().max_key_len + 1);

    let err = map.put_string(&key, "value").unwrap_err();

    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(context.keyspace().cell_count().unwrap(), 0);
}

#[test]
fn multi_read_no_key() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);
    let key = Uuid::now_v7().to_string();

    let results = map.get_strings([key.as_str()]).unwrap();

    assert!(results.get(&key).is_none());
    assert!(results.is_empty());
}

#[test]
fn write_read_string_batch() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);

    map.put_string("key1", "value1").unwrap();
    map.put_string("key2", "value2").unwrap();

    let returned = map.get_strings(vec!["key1", "key2", "key3"]).unwrap();

    assert_eq!(returned.len(), 2);
    assert_eq!(returned.get("key1"), Some(&"value1".to_string()));
    assert_eq!(returned.get("key2"), Some(&"value2".to_string()));
}

#[test]
fn write_read_string_ttl() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);
    let ttl = 5;

    map.put_string_with_ttl("key", "value", ttl).unwrap();
    let start = Instant::now();

    assert_eq!(map.get_string("key").unwrap(), Some("value".to_string()));

    // now sleep and assert it gets removed
    let deadline = Duration::from_secs(u64::from(ttl) + 1);
    thread::sleep(deadline.saturating_sub(start.elapsed()));

    assert_eq!(map.get_string("key").unwrap(), None);
    assert!(map.get_keys(None, 10).unwrap().keys.is_empty());
}

#[test]
fn write_read_long_and_uuid_ttl() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);
    let value = Uuid::new_v4();

    map.put_long_with_ttl("long", 7, 1).unwrap();
    map.put_uuid_with_ttl("uuid", value, 1).unwrap();
    assert_eq!(map.get_long("long").unwrap(), Some(7));
    assert_eq!(map.get_uuid("uuid").unwrap(), Some(value));

    thread::sleep(Duration::from_millis(1100));

    assert_eq!(map.get_long("long").unwrap(), None);
    assert_eq!(map.get_uuid("uuid").unwrap(), None);
}

#[test]
fn delete_string() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);

    map.put_string("key", "value").unwrap();
    assert_eq!(map.get_string("key").unwrap(), Some("value".to_string()));

    map.delete("key").unwrap();

    assert_eq!(map.get_string("key").unwrap(), None);
    assert_eq!(context.keyspace().cell_count().unwrap(), 0);
}

#[test]
fn delete_missing_key_is_noop() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);

    map.delete("never-written").unwrap();
    map.delete("never-written").unwrap();

    assert_eq!(map.get_string("never-written").unwrap(), None);
}

#[test]
fn get_all_keys() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);

    map.put_string("key1", "value").unwrap();
    map.put_string("key2", "value").unwrap();

    let results = map.get_keys(None, 5).unwrap();

    assert_eq!(results.keys.len(), 2);
    assert!(results.cursor.is_none());
}

#[test]
fn get_all_keys_with_start() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);
    put_six(&map);

    let first = map.get_keys(None, 3).unwrap();
    assert_eq!(first.keys.len(), 3);
    assert!(first.keys.contains(&"key1".to_string()));
    assert!(first.cursor.is_some());

    let second = map.get_keys(first.cursor(), 3).unwrap();
    assert_eq!(second.keys.len(), 3);
    assert!(second.keys.contains(&"key4".to_string()));
    assert!(!second.keys.contains(&"key3".to_string()));
}

#[test]
fn keys_ordering_after_delete() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);
    put_six(&map);

    let results = map.get_keys(None, 6).unwrap();
    assert_eq!(results.keys.len(), 6);
    assert_eq!(results.keys[0], "key1");

    map.delete("key1").unwrap();
    map.delete("key2").unwrap();
    map.delete("key3").unwrap();

    let results = map.get_keys(None, 6).unwrap();
    assert_eq!(results.keys, vec!["key4", "key5", "key6"]);
}

#[test]
fn get_all_keys_after_delete() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);
    put_six(&map);

    assert_eq!(map.get_keys(None, 6).unwrap().keys.len(), 6);

    map.delete("key4").unwrap();
    map.delete("key5").unwrap();
    map.delete("key6").unwrap();

    assert_eq!(map.get_keys(None, 6).unwrap().keys.len(), 3);
}

#[test]
fn get_all_keys_after_mass_delete() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);
    let count = 11_000;

    for i in 0..count {
        map.put_string(&format!("key{}", i), "value").unwrap();
    }

    let mut cursor: Option<String> = None;
    let mut seen: Vec<String> = Vec::with_capacity(count);
    loop {
        let page = map.get_keys(cursor.as_deref(), 1000).unwrap();
        seen.extend(page.keys);
        cursor = page.cursor;
        if cursor.is_none() || seen.len() > count {
            break;
        }
    }

    assert_eq!(seen.len(), count);
    assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));

    for i in 0..count - 500 {
        map.delete(&format!("key{}", i)).unwrap();
    }

    let remaining = map.get_keys(None, 1000).unwrap();
    assert_eq!(remaining.keys.len(), 500);
    assert!(remaining.cursor.is_none());
}

#[test]
fn deletion_between_pages_is_visible() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);
    put_six(&map);

    let first = map.get_keys(None, 2).unwrap();
    assert_eq!(first.keys, vec!["key1", "key2"]);

    map.delete("key1").unwrap();
    map.delete("key3").unwrap();

    let second = map.get_keys(first.cursor(), 2).unwrap();
    assert_eq!(second.keys, vec!["key4", "key5"]);
    // the page already returned is unaffected
    assert_eq!(first.keys, vec!["key1", "key2"]);
}

#[test]
fn maps_are_isolated_by_scope() {
    let context = StoreContext::in_memory();
    let owner = Id::new("application");
    let first = context
        .map_manager(MapScope::new(owner.clone(), "first"))
        .unwrap();
    let second = context.map_manager(MapScope::new(owner, "second")).unwrap();

    first.put_string("key", "first").unwrap();
    second.put_string("key", "second").unwrap();
    first.delete("key").unwrap();

    assert_eq!(first.get_string("key").unwrap(), None);
    assert_eq!(second.get_string("key").unwrap(), Some("second".to_string()));
    assert_eq!(second.get_keys(None, 10).unwrap().keys, vec!["key"]);
}

#[test]
fn failed_put_wraps_transport_error() {
    let context = StoreContext::in_memory();
    let map = map_manager(&context);
    context.keyspace().set_online(false);

    let err = map.put_string("key", "value").unwrap_err();
    assert!(matches!(err, StoreError::CommitFailure { .. }));

    context.keyspace().set_online(true);
    assert_eq!(map.get_string("key").unwrap(), None);
}
