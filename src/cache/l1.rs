//! L1 bounded memory tier.
//!
//! A fixed-capacity map evicting the least-recently-used entry. Pure cache: nothing here
//! is durable, and every entry can be rebuilt from the durable tier.

use std::hash::Hash;

use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use crate::constants::DEFAULT_L1_CAPACITY;

/// In-memory LRU tier.
pub struct L1Cache<K, V> {
    entries: Cache<K, V>,
    capacity: u64,
}

impl<K, V> L1Cache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a tier with the default capacity.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_L1_CAPACITY)
    }

    /// Creates a tier holding at most `capacity` entries (LRU eviction).
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .eviction_policy(EvictionPolicy::lru())
                .build(),
            capacity,
        }
    }

    /// Returns the configured capacity.
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Looks up `key`, refreshing its recency on hit.
    ///
    /// The read is applied to the eviction order before returning, so the next insert
    /// cannot evict this key ahead of older ones.
    pub fn get(&self, key: &K) -> Option<V> {
        let value = self.entries.get(key);
        if value.is_some() {
            self.entries.run_pending_tasks();
        }
        value
    }

    /// Inserts or replaces `key`. May evict the least-recently-used entry.
    ///
    /// Eviction runs before returning, so the tier never holds more than its capacity.
    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(key, value);
        self.entries.run_pending_tasks();
    }

    /// Drops `key` if present.
    #[inline]
    pub fn invalidate(&self, key: &K) {
        self.entries.invalidate(key);
    }

    /// Returns `true` if `key` is resident.
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the number of resident entries.
    ///
    /// Pending evictions are applied first so the count never exceeds the capacity.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    /// Returns `true` if no entries are resident.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }

    /// Runs any pending maintenance tasks in the underlying cache.
    #[inline]
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }

    /// Returns a snapshot of resident entries (order unspecified).
    pub fn entries(&self) -> Vec<(K, V)>
    where
        K: Clone,
    {
        self.entries
            .iter()
            .map(|(k, v)| (K::clone(&k), v))
            .collect()
    }
}

impl<K, V> Default for L1Cache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for L1Cache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("L1Cache")
            .field("entries", &self.entries.entry_count())
            .field("capacity", &self.capacity)
            .finish()
    }
}
