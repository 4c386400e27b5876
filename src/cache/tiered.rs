//! Two-tier cache: bounded L1 memory tier in front of the durable L2 tier.
//!
//! Writes go through one critical section that updates L2 before L1, so the volatile tier
//! never holds a value the durable tier does not. Reads take no lock; an L1 miss is served
//! from L2 and copied into L1 when no write has intervened.

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::l1::L1Cache;
use super::l2::{DurableTier, ReclaimReport};
use super::types::TieredLookupResult;
use crate::error::{CacheError, CacheResult};

/// Two-tier, disk-persisted key/value cache. Build one with [`crate::CacheBuilder`].
pub struct TwoTierCache<K, V> {
    l1: L1Cache<K, V>,
    l2: DurableTier<K, V>,
    write_lock: Mutex<()>,
    write_generation: AtomicU64,
}

impl<K, V> fmt::Debug for TwoTierCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoTierCache")
            .field("l1", &self.l1)
            .field("l2", &self.l2)
            .finish()
    }
}

impl<K, V> TwoTierCache<K, V>
where
    K: Hash + Eq + Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(l1: L1Cache<K, V>, l2: DurableTier<K, V>) -> Self {
        Self {
            l1,
            l2,
            write_lock: Mutex::new(()),
            write_generation: AtomicU64::new(0),
        }
    }

    /// The memory tier, for tier-only reads.
    pub fn l1(&self) -> &L1Cache<K, V> {
        &self.l1
    }

    /// The durable tier, for tier-only reads.
    pub fn l2(&self) -> &DurableTier<K, V> {
        &self.l2
    }

    /// Name of the durable tier.
    pub fn name(&self) -> &str {
        self.l2.name()
    }

    /// Returns `true` until [`TwoTierCache::shutdown`] is called.
    pub fn running(&self) -> bool {
        self.l2.is_running()
    }

    fn ensure_running(&self) -> CacheResult<()> {
        if self.running() {
            Ok(())
        } else {
            Err(CacheError::NotRunning {
                name: self.name().to_string(),
            })
        }
    }

    /// Looks up `key`, reporting which tier answered.
    ///
    /// Not serialized with writers: a racing [`TwoTierCache::put`] may be observed either
    /// before or after. Absent keys are not remembered, so a later `put` is always seen.
    #[instrument(skip(self, key), fields(cache = %self.name()))]
    pub fn lookup(&self, key: &K) -> CacheResult<TieredLookupResult<V>> {
        self.ensure_running()?;

        if let Some(value) = self.l1.get(key) {
            debug!("L1 hit");
            return Ok(TieredLookupResult::HitL1(value));
        }

        debug!("L1 miss, checking L2");
        let generation = self.write_generation.load(Ordering::Acquire);
        match self.l2.get(key)? {
            Some(value) => {
                debug!("L2 hit, updating L1");
                self.pull_through(key, &value, generation);
                Ok(TieredLookupResult::HitL2(value))
            }
            None => {
                debug!("L2 miss");
                Ok(TieredLookupResult::Miss)
            }
        }
    }

    /// Copies an L2 value into L1 unless a write started after the L2 read began.
    ///
    /// Skipped rather than waited for when a writer holds the critical section; the next
    /// miss retries.
    fn pull_through(&self, key: &K, value: &V, generation: u64) {
        let Some(_guard) = self.write_lock.try_lock() else {
            debug!("writer active, skipping L1 fill");
            return;
        };
        if self.write_generation.load(Ordering::Acquire) != generation {
            debug!("key space changed during L2 read, skipping L1 fill");
            return;
        }
        self.l1.insert(key.clone(), value.clone());
    }

    /// Returns the value for `key`, or `None` when neither tier has it.
    pub fn get(&self, key: &K) -> CacheResult<Option<V>> {
        self.lookup(key).map(TieredLookupResult::into_value)
    }

    /// Returns the value for `key`, or `default` when absent.
    pub fn get_or_default(&self, key: &K, default: V) -> CacheResult<V> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Stores `value` under `key` in both tiers, durable tier first.
    #[instrument(skip(self, key, value), fields(cache = %self.name()))]
    pub fn put(&self, key: K, value: V) -> CacheResult<()> {
        let _guard = self.write_lock.lock();
        self.ensure_running()?;
        self.write_generation.fetch_add(1, Ordering::AcqRel);

        debug!("adding value to L2");
        self.l2.put(key.clone(), value.clone())?;

        debug!("updating L1");
        self.l1.insert(key, value);
        Ok(())
    }

    /// Removes `key` from both tiers, durable tier first. Absent keys are a no-op.
    #[instrument(skip(self, key), fields(cache = %self.name()))]
    pub fn remove(&self, key: &K) -> CacheResult<()> {
        let _guard = self.write_lock.lock();
        self.ensure_running()?;
        self.write_generation.fetch_add(1, Ordering::AcqRel);

        let existed = self.l2.remove(key)?;
        self.l1.invalidate(key);
        debug!(existed, "removed");
        Ok(())
    }

    /// Removes every entry from both tiers.
    ///
    /// On a stopped cache the durable tier is left untouched and only a warning is logged;
    /// the memory tier is still emptied.
    #[instrument(skip(self), fields(cache = %self.name()))]
    pub fn reinit(&self) -> CacheResult<()> {
        let _guard = self.write_lock.lock();
        self.write_generation.fetch_add(1, Ordering::AcqRel);

        if self.running() {
            self.l2.clear()?;
            self.reclaim_locked()?;
        } else {
            warn!("cache is not running, cannot reinit L2");
        }
        self.l1.clear();
        Ok(())
    }

    /// Runs both L2 reclaim passes: idle-value demotion, then file-level cleanup.
    pub fn cleanup_l2_storage(&self) -> CacheResult<ReclaimReport> {
        let _guard = self.write_lock.lock();
        self.reclaim_locked()
    }

    fn reclaim_locked(&self) -> CacheResult<ReclaimReport> {
        let demoted = self.l2.issue_full_cache_check()?;
        let files = self.l2.issue_full_file_check()?;
        let report = ReclaimReport { demoted, ..files };
        debug!(?report, "reclaimed L2 storage");
        Ok(report)
    }

    /// Number of keys resident in L1.
    pub fn num_l1_keys(&self) -> u64 {
        self.l1.len()
    }

    /// Number of keys stored in L2.
    pub fn num_l2_keys(&self) -> u64 {
        self.l2.len()
    }

    /// Stops the durable tier and releases the storage directory (idempotent).
    pub fn shutdown(&self) {
        let _guard = self.write_lock.lock();
        if !self.running() {
            debug!(cache = %self.name(), "already shut down");
            return;
        }

        info!(cache = %self.name(), "shutting down cache");
        self.l2.shutdown();
        info!(cache = %self.name(), "cache shutdown");
    }
}

impl<K, V> TwoTierCache<K, V>
where
    K: Hash + Eq + Clone + Serialize + DeserializeOwned + Send + Sync + fmt::Debug + 'static,
    V: Clone + Serialize + DeserializeOwned + Send + Sync + fmt::Debug + 'static,
{
    /// Writes every L1 entry as `"   n: 'key' == value"`, one per line.
    pub fn show_l1<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        for (n, (key, value)) in self.l1.entries().iter().enumerate() {
            writeln!(out, "{:4}: '{:?}' == {:?}", n, key, value)?;
        }
        Ok(())
    }

    /// Writes every `skip`-th L2 entry in the same format as [`TwoTierCache::show_l1`].
    ///
    /// Values only on disk are loaded to be printed. A `skip` below 1 is treated as 1.
    pub fn show_l2<W: fmt::Write>(&self, out: &mut W, skip: usize) -> CacheResult<()> {
        let skip = skip.max(1);
        let mut n = 0usize;
        self.l2.for_each_entry(|key, value| {
            if n.is_multiple_of(skip) {
                writeln!(out, "{:4}: '{:?}' == {:?}", n, key, value)?;
            }
            n += 1;
            Ok(())
        })
    }
}
