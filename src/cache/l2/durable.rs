//! L2 durable tier.
//!
//! Wraps a [`SegmentStore`] with an in-memory key index whose values are materialized
//! lazily. Values idle for longer than the lazy timeout are demoted back to
//! [`LazyValue::OnDisk`] by a housekeeping thread; reading one reloads its whole segment.

use std::hash::Hash;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::config::L2Config;
use super::housekeeping::Housekeeper;
use super::lazy::{Probe, TierState};
use super::types::ReclaimReport;
use crate::error::{CacheError, CacheResult};
use crate::hashing::key_fingerprint;
use crate::storage::{DiskHandle, SegmentStore, StorageError, StorageStats, codec};

/// Unbounded, crash-durable key/value tier with lazy value materialization.
pub struct DurableTier<K, V> {
    name: String,
    config: L2Config,
    store: SegmentStore,
    state: Arc<Mutex<TierState<K, V>>>,
    running: AtomicBool,
    housekeeper: Mutex<Option<Housekeeper>>,
}

impl<K, V> DurableTier<K, V>
where
    K: Hash + Eq + Clone + Serialize + DeserializeOwned + Send + 'static,
    V: Clone + Serialize + DeserializeOwned + Send + 'static,
{
    /// Opens (or creates) the tier rooted at `root`, taking exclusive ownership of it.
    ///
    /// Only key prefixes are read here; every value starts out on disk.
    pub fn open(root: &Path, name: &str, config: L2Config) -> CacheResult<Self> {
        let store = SegmentStore::open(root, name)?;
        let mut state = TierState::new(config.entities_per_segment);

        for handle in store.scan()? {
            let key_bytes = store.read_key_bytes(&handle)?;
            if key_fingerprint(&key_bytes) != handle.fingerprint() {
                return Err(StorageError::Corrupt {
                    path: store.entry_path(&handle),
                    reason: "file name does not match key fingerprint".to_string(),
                }
                .into());
            }
            let key: K = codec::decode_key(&key_bytes).map_err(|e| StorageError::Corrupt {
                path: store.entry_path(&handle),
                reason: e.to_string(),
            })?;
            if let Some(stale) = state.insert_on_disk(key, handle) {
                warn!(path = %store.entry_path(&stale).display(), "removing superseded entry");
                store.delete(&stale)?;
            }
        }

        let entries = state.len();
        let tier = Self {
            name: name.to_string(),
            config,
            store,
            state: Arc::new(Mutex::new(state)),
            running: AtomicBool::new(true),
            housekeeper: Mutex::new(None),
        };
        tier.start_housekeeping()?;

        info!(
            name = %tier.name,
            path = %root.display(),
            entries,
            "durable tier opened"
        );
        Ok(tier)
    }

    fn start_housekeeping(&self) -> CacheResult<()> {
        let state = Arc::clone(&self.state);
        let timeout = self.config.lazy_timeout;
        let name = self.name.clone();

        let keeper = Housekeeper::spawn(&self.name, self.config.housekeeping_interval, move || {
            let demoted = state.lock().demote_idle(Instant::now(), timeout);
            if demoted > 0 {
                debug!(name = %name, demoted, "demoted idle values to disk");
            }
        })
        .map_err(StorageError::Io)?;

        *self.housekeeper.lock() = Some(keeper);
        Ok(())
    }

    /// Returns the tier name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the storage root.
    pub fn root(&self) -> &Path {
        self.store.root()
    }

    /// Returns the active config.
    pub fn config(&self) -> &L2Config {
        &self.config
    }

    /// Returns `true` until [`DurableTier::shutdown`] is called.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn ensure_running(&self) -> CacheResult<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(CacheError::NotRunning {
                name: self.name.clone(),
            })
        }
    }

    /// Reads `key`, reloading its segment from disk if the value was demoted.
    pub fn get(&self, key: &K) -> CacheResult<Option<V>> {
        let mut state = self.state.lock();
        self.ensure_running()?;

        match state.probe(key, Instant::now()) {
            Probe::Missing => Ok(None),
            Probe::Resident(value) => Ok(Some(value)),
            Probe::OnDisk { segment } => {
                self.load_segment(&mut state, segment, Some(key))?;
                match state.probe(key, Instant::now()) {
                    Probe::Resident(value) => Ok(Some(value)),
                    _ => Ok(None),
                }
            }
        }
    }

    /// Loads every on-disk member of `segment`.
    ///
    /// A failure on `wanted` is returned; failures on its neighbours are logged and leave
    /// them on disk for a later attempt.
    fn load_segment(
        &self,
        state: &mut TierState<K, V>,
        segment: u64,
        wanted: Option<&K>,
    ) -> CacheResult<()> {
        let now = Instant::now();
        let mut loaded = 0usize;

        for (member, handle) in state.on_disk_members(segment) {
            match self.load_entry(&handle, &member) {
                Ok(value) => {
                    state.materialize(&member, value, now);
                    loaded += 1;
                }
                Err(e) if wanted == Some(&member) => return Err(e),
                Err(e) => {
                    warn!(
                        name = %self.name,
                        path = %self.store.entry_path(&handle).display(),
                        error = %e,
                        "failed to load segment neighbour"
                    );
                }
            }
        }

        debug!(name = %self.name, segment, loaded, "materialized segment");
        Ok(())
    }

    fn load_entry(&self, handle: &DiskHandle, expected: &K) -> CacheResult<V> {
        let bytes = self.store.read(handle)?;
        let (key, value): (K, V) =
            codec::decode_record(&bytes).map_err(|e| StorageError::Corrupt {
                path: self.store.entry_path(handle),
                reason: e.to_string(),
            })?;
        if key != *expected {
            return Err(StorageError::Corrupt {
                path: self.store.entry_path(handle),
                reason: "stored key does not match index".to_string(),
            }
            .into());
        }
        Ok(value)
    }

    /// Durably writes `key`, replacing any previous value.
    ///
    /// Returns once the entry file has been synced and renamed into place.
    pub fn put(&self, key: K, value: V) -> CacheResult<()> {
        let key_bytes = codec::encode_key(&key)?;
        let record = codec::encode_record(&key_bytes, &value)?;
        let fingerprint = key_fingerprint(&key_bytes);

        let mut state = self.state.lock();
        self.ensure_running()?;

        let handle = state.handle_for(&key, fingerprint);
        self.store.write(&handle, &record)?;
        state.insert_resident(key, handle, value, Instant::now());
        Ok(())
    }

    /// Deletes `key`. Returns `false` if it was absent.
    pub fn remove(&self, key: &K) -> CacheResult<bool> {
        let mut state = self.state.lock();
        self.ensure_running()?;

        let Some(handle) = state.handle_of(key) else {
            return Ok(false);
        };
        self.store.delete(&handle)?;
        state.remove(key);
        Ok(true)
    }

    /// Deletes every entry.
    pub fn clear(&self) -> CacheResult<()> {
        let mut state = self.state.lock();
        self.ensure_running()?;

        if let Err(e) = self.store.clear() {
            for segment in state.segment_ids() {
                if !self.store.segment_exists(segment) {
                    state.drop_segment(segment);
                }
            }
            return Err(e.into());
        }
        state.clear();
        Ok(())
    }

    /// Number of keys (resident or on disk).
    pub fn len(&self) -> u64 {
        self.state.lock().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `key` is stored, without materializing its value.
    pub fn contains_key(&self, key: &K) -> bool {
        self.state.lock().contains_key(key)
    }

    /// Number of values currently materialized in memory.
    pub fn resident_len(&self) -> usize {
        self.state.lock().resident_count()
    }

    /// Demotes values idle for at least the lazy timeout. Returns the count demoted.
    pub fn issue_full_cache_check(&self) -> CacheResult<usize> {
        let mut state = self.state.lock();
        self.ensure_running()?;
        Ok(state.demote_idle(Instant::now(), self.config.lazy_timeout))
    }

    /// Reclaims file-level space: stray temp files and empty segment directories.
    pub fn issue_full_file_check(&self) -> CacheResult<ReclaimReport> {
        let _state = self.state.lock();
        self.ensure_running()?;

        let temp_files_removed = self.store.remove_stray_temp_files()?;
        let segments_removed = self.store.remove_empty_segments()?;
        Ok(ReclaimReport {
            demoted: 0,
            temp_files_removed,
            segments_removed,
        })
    }

    /// Visits every entry segment by segment, materializing on-disk values as it goes.
    pub fn for_each_entry<F>(&self, mut visit: F) -> CacheResult<()>
    where
        F: FnMut(&K, &V) -> CacheResult<()>,
    {
        let mut state = self.state.lock();
        self.ensure_running()?;

        for segment in state.segment_ids() {
            self.load_segment(&mut state, segment, None)?;
            for (key, value) in state.resident_entries(segment) {
                visit(&key, &value)?;
            }
        }
        Ok(())
    }

    /// Returns on-disk stats for the tier.
    pub fn storage_stats(&self) -> CacheResult<StorageStats> {
        let _state = self.state.lock();
        Ok(self.store.stats()?)
    }

    /// Stops housekeeping and releases the directory lock (idempotent).
    ///
    /// Returns `false` if the tier was already stopped.
    pub fn shutdown(&self) -> bool {
        {
            let _state = self.state.lock();
            if !self.running.swap(false, Ordering::AcqRel) {
                return false;
            }
        }

        if let Some(mut keeper) = self.housekeeper.lock().take() {
            keeper.stop();
        }
        self.store.release();
        true
    }
}

impl<K, V> Drop for DurableTier<K, V> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(mut keeper) = self.housekeeper.get_mut().take() {
            keeper.stop();
        }
        self.store.release();
    }
}

impl<K, V> std::fmt::Debug for DurableTier<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableTier")
            .field("name", &self.name)
            .field("root", &self.store.root())
            .field("running", &self.running.load(Ordering::Acquire))
            .field("config", &self.config)
            .finish()
    }
}
