use crate::clock::{Clock, SystemClock};
use crate::entry::CacheEntry;
use crate::stats::CacheStats;
use optimizer_core::{CacheConfig, OptError, OptResult};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tracing::{debug, error};

/// Bounded key-value cache with lazy TTL expiry and LFU eviction.
///
/// `len() <= capacity()` always holds. Lookups never fail: a missing or
/// expired key is `None`.
///
/// Eviction scans every entry for the minimum `(access_count, inserted_at,
/// seq)`, so a `set` on a full cache costs O(capacity). Lookups and inserts
/// below capacity stay O(1).
#[derive(Debug)]
pub struct Cache<K, V, C = SystemClock> {
    name: &'static str,
    capacity: usize,
    ttl: Option<Duration>,
    entries: HashMap<K, CacheEntry<V>>,
    clock: C,
    next_seq: u64,
    stats: CacheStats,
}

impl<K, V> Cache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
{
    /// Fails only when `capacity` is 0.
    pub fn new(capacity: usize, ttl: Option<Duration>) -> OptResult<Self> {
        Self::with_clock(capacity, ttl, SystemClock)
    }

    pub fn from_config(config: &CacheConfig) -> OptResult<Self> {
        Self::new(config.capacity, config.ttl())
    }
}

impl<K, V, C> Cache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    pub fn with_clock(capacity: usize, ttl: Option<Duration>, clock: C) -> OptResult<Self> {
        if capacity == 0 {
            error!("Cache config error: capacity cannot be 0");
            return Err(OptError::invalid_input("cache capacity cannot be 0"));
        }
        Ok(Self {
            name: "cache",
            capacity,
            ttl,
            entries: HashMap::new(),
            clock,
            next_seq: 0,
            stats: CacheStats::default(),
        })
    }

    /// Label used in log lines.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Value for `key`, counting the access.
    ///
    /// An entry older than the TTL is removed and reported as a miss.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(self.ttl, now),
            None => {
                self.stats.misses += 1;
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.stats.expirations += 1;
            self.stats.misses += 1;
            debug!("{}: entry expired on access", self.name);
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.access_count += 1;
        self.stats.hits += 1;
        Some(entry.value.clone())
    }

    /// Insert or overwrite `key` with a fresh entry.
    ///
    /// When the cache is full one entry is evicted first, even if `key` is
    /// already present.
    pub fn set(&mut self, key: K, value: V) {
        if self.entries.len() >= self.capacity {
            self.evict_one();
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        let entry = CacheEntry::new(value, self.clock.now(), seq);
        self.entries.insert(key, entry);
    }

    pub fn delete<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether `key` is present and unexpired. Does not count as an access.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        self.entries
            .get(key)
            .map_or(false, |entry| !entry.is_expired(self.ttl, now))
    }

    /// Accesses recorded for `key` since it was last set.
    pub fn access_count<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|entry| entry.access_count)
    }

    /// Drop every expired entry now instead of waiting for lookups.
    pub fn purge_expired(&mut self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let now = self.clock.now();
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(ttl, now));
        let removed = before - self.entries.len();
        self.stats.expirations += removed as u64;
        if removed > 0 {
            debug!("{}: purged {} expired entries", self.name, removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            len: self.entries.len(),
            capacity: self.capacity,
            ..self.stats
        }
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// Remove the entry with the fewest accesses; among those the oldest,
    /// then the earliest inserted.
    fn evict_one(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.eviction_key())
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            if let Some(entry) = self.entries.remove(&key) {
                self.stats.evictions += 1;
                debug!(
                    "{}: evicted entry with {} accesses (capacity {})",
                    self.name, entry.access_count, self.capacity
                );
            }
        }
    }
}
