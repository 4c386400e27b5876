//! Fluent construction of a [`TwoTierCache`].

use std::fs;
use std::hash::Hash;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use super::l1::L1Cache;
use super::l2::{DurableTier, L2Config};
use super::tiered::TwoTierCache;
use crate::config::CacheConfig;
use crate::error::CacheResult;
use crate::storage::StorageError;

/// Starts a builder for a cache stored in `dir`.
pub fn builder(dir: impl Into<PathBuf>) -> CacheBuilder {
    CacheBuilder::at(dir)
}

/// Builder for [`TwoTierCache`].
///
/// [`CacheBuilder::build`] borrows the builder, so one builder can produce a fresh cache
/// after the previous one was shut down.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    config: CacheConfig,
}

impl CacheBuilder {
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            config: CacheConfig::at(dir),
        }
    }

    pub fn from_config(config: CacheConfig) -> Self {
        Self { config }
    }

    /// Overrides the default name (final component of the storage path).
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Caps the number of entries kept in the L1 memory tier.
    pub fn max_in_memory_entities(mut self, max: u64) -> Self {
        self.config.l1_capacity = max;
        self
    }

    pub fn lazy_timeout(mut self, timeout: Duration) -> Self {
        self.config.lazy_timeout = timeout;
        self
    }

    pub fn entities_per_segment(mut self, entities: usize) -> Self {
        self.config.entities_per_segment = entities;
        self
    }

    pub fn housekeeping_interval(mut self, interval: Duration) -> Self {
        self.config.housekeeping_interval = interval;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Validates the configuration, opens the durable tier and returns a running cache.
    ///
    /// Fails with [`crate::ConfigError::StorageLocked`] while another cache owns the
    /// directory. Failing to create the directory is a [`StorageError::Io`].
    pub fn build<K, V>(&self) -> CacheResult<TwoTierCache<K, V>>
    where
        K: Hash + Eq + Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
        V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.config.validate()?;

        let root = self
            .config
            .absolute_storage_path()
            .map_err(StorageError::Io)?;
        if !root.exists() {
            fs::create_dir_all(&root).map_err(StorageError::Io)?;
            info!(path = %root.display(), "created storage directory");
        }

        let name = self.config.resolved_name().map_err(StorageError::Io)?;
        let l2_config = L2Config::default()
            .lazy_timeout(self.config.lazy_timeout)
            .entities_per_segment(self.config.entities_per_segment)
            .housekeeping_interval(self.config.housekeeping_interval);

        let l2 = DurableTier::open(&root, &name, l2_config)?;
        let l1 = L1Cache::with_capacity(self.config.l1_capacity);

        info!(
            name = %name,
            path = %root.display(),
            l1_capacity = self.config.l1_capacity,
            entries = l2.len(),
            "cache built"
        );
        Ok(TwoTierCache::new(l1, l2))
    }
}
