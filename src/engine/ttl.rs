//! MVSTORE - Time-To-Live (TTL) Support
//! Expiring cells, the keyspace's native equivalent of a column TTL.
//!
//! A cell written with a TTL stores an absolute expiration timestamp
//! (Unix epoch milliseconds) computed at write time. Reads treat a cell
//! as absent once that instant has passed; compaction later purges it.
//! Storing the absolute instant keeps expiry correct across WAL replay.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current time in milliseconds since Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Absolute expiration instant for a cell written now with `ttl`.
pub fn expires_at(ttl: Duration) -> u64 {
    now_ms().saturating_add(ttl.as_millis() as u64)
}

/// Returns `true` if the cell has an expiration and it has passed.
/// Cells without an expiration never expire.
pub fn is_expired(expires_at_ms: Option<u64>, now_ms: u64) -> bool {
    match expires_at_ms {
        Some(expires_at) => now_ms >= expires_at,
        None => false,
    }
}

/// Remaining lifetime in milliseconds.
/// `None` if the cell never expires, `Some(0)` if it already has.
pub fn remaining_ms(expires_at_ms: Option<u64>, now_ms: u64) -> Option<u64> {
    expires_at_ms.map(|expires_at| expires_at.saturating_sub(now_ms))
}
