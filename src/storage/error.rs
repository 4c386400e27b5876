use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
/// Errors returned by the on-disk segment store.
pub enum StorageError {
    /// IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key or value could not be (de)serialized.
    #[error("codec error: {0}")]
    Codec(String),

    /// An entry file exists but its contents are unusable.
    #[error("corrupt entry file {path}: {reason}")]
    Corrupt {
        /// Offending file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The directory was written by an incompatible format version.
    #[error("incompatible storage format version {found} (expected {expected})")]
    IncompatibleFormat {
        /// Version found in the manifest.
        found: u32,
        /// Version this build writes.
        expected: u32,
    },

    /// The directory is exclusively held by another open store.
    #[error("storage directory {path} is locked by another cache")]
    Locked {
        /// Locked directory.
        path: PathBuf,
    },
}

/// Convenience result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
