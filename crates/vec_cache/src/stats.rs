use serde::{Deserialize, Serialize};

/// Counters for one cache, monotonic until `reset_stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups that returned a value
    pub hits: u64,
    /// Lookups for absent or expired keys
    pub misses: u64,
    /// Entries removed to make room on `set`
    pub evictions: u64,
    /// Entries removed because their TTL passed
    pub expirations: u64,
    pub len: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups that hit; 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            n => self.hits as f64 / n as f64,
        }
    }
}
