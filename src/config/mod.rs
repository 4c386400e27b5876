//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `STRATA_*` environment variables, then hand
//! the result to [`crate::cache::CacheBuilder::from_config`].

pub mod error;

#[cfg(test)]
mod tests;

pub use error::{ConfigError, ConfigResult};

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_ENTITIES_PER_SEGMENT, DEFAULT_L1_CAPACITY, default_housekeeping_interval,
    default_lazy_timeout,
};

/// Cache configuration.
///
/// Use [`CacheConfig::from_env`] to read `STRATA_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory owned by the durable tier. Default: `./.data`.
    pub storage_path: PathBuf,

    /// Cache name. Default: final component of the absolute storage path.
    pub name: Option<String>,

    /// Max entries in the in-memory L1 tier. Default: `1_000`.
    pub l1_capacity: u64,

    /// Idle time before a resident L2 value is demoted to disk. Default: 30s.
    pub lazy_timeout: Duration,

    /// Entries per lazily-loaded L2 segment. Default: `10`.
    pub entities_per_segment: usize,

    /// Interval between background L2 housekeeping passes. Default: 5s.
    pub housekeeping_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./.data"),
            name: None,
            l1_capacity: DEFAULT_L1_CAPACITY,
            lazy_timeout: default_lazy_timeout(),
            entities_per_segment: DEFAULT_ENTITIES_PER_SEGMENT,
            housekeeping_interval: default_housekeeping_interval(),
        }
    }
}

impl CacheConfig {
    const ENV_STORAGE_PATH: &'static str = "STRATA_STORAGE_PATH";
    const ENV_CACHE_NAME: &'static str = "STRATA_CACHE_NAME";
    const ENV_L1_CAPACITY: &'static str = "STRATA_L1_CAPACITY";
    const ENV_LAZY_TIMEOUT_SECS: &'static str = "STRATA_LAZY_TIMEOUT_SECS";
    const ENV_ENTITIES_PER_SEGMENT: &'static str = "STRATA_ENTITIES_PER_SEGMENT";
    const ENV_HOUSEKEEPING_INTERVAL_SECS: &'static str = "STRATA_HOUSEKEEPING_INTERVAL_SECS";

    /// Creates a default configuration rooted at `storage_path`.
    pub fn at(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            ..Default::default()
        }
    }

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();

        let storage_path = env::var(Self::ENV_STORAGE_PATH)
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_path);
        let name = env::var(Self::ENV_CACHE_NAME)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let l1_capacity = Self::parse_from_env(Self::ENV_L1_CAPACITY, defaults.l1_capacity)?;
        let lazy_timeout = Self::parse_from_env(
            Self::ENV_LAZY_TIMEOUT_SECS,
            defaults.lazy_timeout.as_secs(),
        )
        .map(Duration::from_secs)?;
        let entities_per_segment = Self::parse_from_env(
            Self::ENV_ENTITIES_PER_SEGMENT,
            defaults.entities_per_segment,
        )?;
        let housekeeping_interval = Self::parse_from_env(
            Self::ENV_HOUSEKEEPING_INTERVAL_SECS,
            defaults.housekeeping_interval.as_secs(),
        )
        .map(Duration::from_secs)?;

        Ok(Self {
            storage_path,
            name,
            l1_capacity,
            lazy_timeout,
            entities_per_segment,
            housekeeping_interval,
        })
    }

    /// Validates the storage path and sizes (does not create directories).
    pub fn validate(&self) -> ConfigResult<()> {
        validate_storage_dir(&self.storage_path)?;

        if self.l1_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                name: "l1_capacity",
                value: self.l1_capacity.to_string(),
            });
        }
        if self.entities_per_segment == 0 {
            return Err(ConfigError::InvalidValue {
                name: "entities_per_segment",
                value: self.entities_per_segment.to_string(),
            });
        }
        if self.housekeeping_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "housekeeping_interval",
                value: format!("{:?}", self.housekeeping_interval),
            });
        }

        Ok(())
    }

    /// Returns the absolute storage path (relative paths resolve against the cwd).
    pub fn absolute_storage_path(&self) -> io::Result<PathBuf> {
        std::path::absolute(&self.storage_path)
    }

    /// Returns the configured name, or the final component of the absolute storage path.
    pub fn resolved_name(&self) -> io::Result<String> {
        if let Some(name) = &self.name {
            return Ok(name.clone());
        }
        let absolute = self.absolute_storage_path()?;
        Ok(absolute
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| absolute.to_string_lossy().into_owned()))
    }

    fn parse_from_env<T: std::str::FromStr>(name: &'static str, default: T) -> ConfigResult<T> {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::EnvParse { name, value }),
            Err(_) => Ok(default),
        }
    }
}

/// Checks the storage directory constraints.
///
/// A missing path is accepted (it is created at build time). An existing path must be a
/// directory that can be listed and written to.
pub fn validate_storage_dir(path: &Path) -> ConfigResult<()> {
    if !path.exists() {
        return Ok(());
    }

    if !path.is_dir() {
        return Err(ConfigError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    if fs::read_dir(path).is_err() {
        return Err(ConfigError::NotReadable {
            path: path.to_path_buf(),
        });
    }

    // Probe file is removed when dropped.
    if tempfile::Builder::new()
        .prefix(".write-probe")
        .tempfile_in(path)
        .is_err()
    {
        return Err(ConfigError::NotWritable {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}
