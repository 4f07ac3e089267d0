//! Cache Statistics Module
//!
//! Tracks client activity: hits, misses, writes, deletes and failures.

use serde::Serialize;

// == Cache Stats ==
/// Counters describing what the client has done since construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads that returned a record
    pub hits: u64,
    /// Reads that found no record
    pub misses: u64,
    /// Writes dispatched to the store
    pub writes: u64,
    /// Writes skipped because the token was already cancelled
    pub skipped_writes: u64,
    /// Deletes that completed
    pub deletes: u64,
    /// Operations that returned because the token fired first
    pub cancellations: u64,
    /// Operations that failed with a store, decode or task error
    pub failures: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads completed.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn record_skipped_write(&mut self) {
        self.skipped_writes += 1;
    }

    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    pub fn record_cancellation(&mut self) {
        self.cancellations += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }
}
