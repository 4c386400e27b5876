//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating cache configuration or claiming a storage directory.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Path exists but is not a directory.
    #[error("storage path {path} is not a directory")]
    NotADirectory { path: PathBuf },

    /// Directory exists but its contents cannot be listed.
    #[error("storage path {path} is not readable")]
    NotReadable { path: PathBuf },

    /// Directory exists but files cannot be created in it.
    #[error("storage path {path} is not writable")]
    NotWritable { path: PathBuf },

    /// Another running cache (in this or another process) owns the directory.
    #[error("storage path {path} is already in use by another cache")]
    StorageLocked { path: PathBuf },

    /// A numeric setting is outside its accepted range.
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    /// An environment variable could not be parsed.
    #[error("failed to parse environment variable {name}='{value}'")]
    EnvParse { name: &'static str, value: String },
}

/// Convenience result type for configuration checks.
pub type ConfigResult<T> = Result<T, ConfigError>;
