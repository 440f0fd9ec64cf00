use std::time::{Duration, Instant};

/// A cached value with the bookkeeping eviction and expiry need.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    /// Set on every `set`, never refreshed by `get`
    pub inserted_at: Instant,
    /// Successful `get`s since the last `set`
    pub access_count: u64,
    /// Per-cache insertion order, the last eviction tie-break
    pub seq: u64,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, inserted_at: Instant, seq: u64) -> Self {
        Self {
            value,
            inserted_at,
            access_count: 0,
            seq,
        }
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inserted_at)
    }

    /// Expired once strictly older than `ttl`.
    pub fn is_expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        ttl.map_or(false, |ttl| self.age(now) > ttl)
    }

    /// Eviction order: fewest accesses, then oldest, then first inserted.
    pub(crate) fn eviction_key(&self) -> (u64, Instant, u64) {
        (self.access_count, self.inserted_at, self.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_is_strict() {
        let t0 = Instant::now();
        let entry = CacheEntry::new("v", t0, 0);
        let ttl = Some(Duration::from_secs(1));
        assert!(!entry.is_expired(ttl, t0 + Duration::from_secs(1)));
        assert!(entry.is_expired(ttl, t0 + Duration::from_millis(1001)));
        assert!(!entry.is_expired(None, t0 + Duration::from_secs(3600)));
    }

    #[test]
    fn test_new_entry_starts_unaccessed() {
        let entry = CacheEntry::new(1u8, Instant::now(), 3);
        assert_eq!(entry.access_count, 0);
        assert_eq!(entry.seq, 3);
    }
}
