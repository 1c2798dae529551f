//! MVSTORE - Keyspace Metrics & Observability
//! Atomic counters for keyspace activity, updated without locking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Operation counters for a keyspace.
///
/// All counters use `Ordering::Relaxed`; they are for observability,
/// not synchronization.
#[derive(Debug)]
pub struct KeyspaceMetrics {
    /// Batches applied.
    pub batches: AtomicU64,
    /// Individual mutations applied.
    pub mutations: AtomicU64,
    /// Single-column reads.
    pub reads: AtomicU64,
    /// Column scans.
    pub scans: AtomicU64,
    /// Batch submissions that failed.
    pub failed_submissions: AtomicU64,
    /// Operations that gave up waiting for the keyspace.
    pub timeouts: AtomicU64,
    /// Bytes written by applied mutations.
    pub bytes_written: AtomicU64,
    /// Batches replayed from the WAL at open.
    pub recovered_batches: AtomicU64,
    /// Compaction runs.
    pub compactions: AtomicU64,
    opened: Instant,
}

impl KeyspaceMetrics {
    pub fn new() -> Self {
        Self {
            batches: AtomicU64::new(0),
            mutations: AtomicU64::new(0),
            reads: AtomicU64::new(0),
            scans: AtomicU64::new(0),
            failed_submissions: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            recovered_batches: AtomicU64::new(0),
            compactions: AtomicU64::new(0),
            opened: Instant::now(),
        }
    }

    pub fn record_batch(&self, mutations: usize, bytes: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.mutations.fetch_add(mutations as u64, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_submission(&self) {
        self.failed_submissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_recovery(&self, batches: usize) {
        self.recovered_batches
            .fetch_add(batches as u64, Ordering::Relaxed);
    }

    pub fn record_compaction(&self) {
        self.compactions.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of batches applied so far.
    pub fn batch_count(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> f64 {
        self.opened.elapsed().as_secs_f64()
    }

    /// Reads + scans + batches.
    pub fn total_ops(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
            + self.reads.load(Ordering::Relaxed)
            + self.scans.load(Ordering::Relaxed)
    }

    /// Format metrics as a human-readable report.
    pub fn report(&self) -> String {
        format!(
            "\n═══ Keyspace Metrics ═══\n\
             Writes:\n\
               batches:    {}\n\
               mutations:  {}\n\
               written:    {} bytes\n\
               failed:     {}\n\
             Reads:\n\
               reads:      {}\n\
               scans:      {}\n\
             Timeouts:     {}\n\
             Recovery:     {} batches\n\
             Compactions:  {}\n\
             Uptime: {:.2}s",
            self.batches.load(Ordering::Relaxed),
            self.mutations.load(Ordering::Relaxed),
            self.bytes_written.load(Ordering::Relaxed),
            self.failed_submissions.load(Ordering::Relaxed),
            self.reads.load(Ordering::Relaxed),
            self.scans.load(Ordering::Relaxed),
            self.timeouts.load(Ordering::Relaxed),
            self.recovered_batches.load(Ordering::Relaxed),
            self.compactions.load(Ordering::Relaxed),
            self.uptime_secs(),
        )
    }
}

impl Default for KeyspaceMetrics {
    fn default() -> Self {
        Self::new()
    }
}
