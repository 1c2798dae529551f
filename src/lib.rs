//! MVSTORE - Versioned Entity Store & Map Manager
//!
//! Multi-version entity persistence and scoped key/value maps over a
//! crash-recoverable, in-process ordered column store.
//!
//! ## Features
//! - **MVCC pipeline**: explicit write/delete stage chains; a version is
//!   visible only once its log entry is `Committed`
//! - **Delete commit**: log commit and payload tombstone applied as one batch
//! - **Map manager**: string/long/uuid values, per-entry TTL, cursor-paginated keys
//! - **Write-Ahead Log (WAL)**: one CRC32-checked frame per batch, replayed atomically
//! - **TTL Support**: expiring cells, purged by compaction
//! - **Metrics**: Lock-free atomic counters for observability
//! - **Concurrency**: cloneable `Arc` + `RwLock` keyspace handle with bounded waits
//!
//! ## Example
//! ```no_run
//! use mvstore::{config::Config, context::StoreContext, types::{Id, MapScope}};
//!
//! let context = StoreContext::open(Config::new("./data")).unwrap();
//! let map = context
//!     .map_manager(MapScope::new(Id::new("application"), "settings"))
//!     .unwrap();
//!
//! map.put_string("theme", "dark").unwrap();
//! assert_eq!(map.get_string("theme").unwrap(), Some("dark".to_string()));
//! ```

pub mod codec;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod map;
pub mod model;
pub mod mvcc;
pub mod types;

pub use context::StoreContext;
pub use error::{Result, StoreError, TransportError};
