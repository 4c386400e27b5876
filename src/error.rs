//! Crate-level error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::storage::StorageError;

/// Errors surfaced by [`crate::TwoTierCache`] and [`crate::CacheBuilder`].
#[derive(Debug, Error)]
pub enum CacheError {
    /// Invalid storage directory, invalid setting, or a directory already in use.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The cache was shut down; build a new instance to continue.
    #[error("cache '{name}' is not running")]
    NotRunning { name: String },

    /// Underlying I/O or codec failure in the durable tier.
    #[error("storage error: {0}")]
    Storage(StorageError),

    /// A diagnostic dump could not be written to its sink.
    #[error("failed to write diagnostic output")]
    Format(#[from] std::fmt::Error),
}

impl From<StorageError> for CacheError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Locked { path } => Self::Config(ConfigError::StorageLocked { path }),
            other => Self::Storage(other),
        }
    }
}

impl CacheError {
    /// Returns `true` for [`CacheError::NotRunning`].
    pub fn is_not_running(&self) -> bool {
        matches!(self, Self::NotRunning { .. })
    }
}

/// Convenience result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
