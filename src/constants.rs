//! Cross-cutting, shared constants.
//!
//! Defaults live here so the builder, [`crate::config::CacheConfig`] and the durable tier
//! agree on them without importing each other.

use std::time::Duration;

/// Default maximum number of entries held in the L1 memory tier.
pub const DEFAULT_L1_CAPACITY: u64 = 1_000;

/// Default number of entries grouped into one lazily-loaded L2 segment.
///
/// Resolving a lazy value loads its whole segment, so this trades lazy-load
/// granularity against per-miss I/O. Kept small because L2 mainly feeds L1.
pub const DEFAULT_ENTITIES_PER_SEGMENT: usize = 10;

/// Default idle time after which a resident L2 value is demoted to its on-disk form.
pub const DEFAULT_LAZY_TIMEOUT_SECS: u64 = 30;

/// Default interval between background L2 housekeeping passes.
pub const DEFAULT_HOUSEKEEPING_INTERVAL_SECS: u64 = 5;

/// On-disk format version written to the manifest.
pub const STORAGE_FORMAT_VERSION: u32 = 1;

/// Lock file that marks exclusive ownership of a storage directory.
pub const LOCK_FILE_NAME: &str = ".lock";

/// Manifest describing the storage directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Directory holding the segment directories.
pub const SEGMENTS_DIR_NAME: &str = "segments";

/// Extension of a committed entry file.
pub const ENTRY_EXTENSION: &str = "entry";

/// Extension of an entry file that has not been renamed into place yet.
pub const TEMP_EXTENSION: &str = "tmp";

/// Prefix of numbered store directories, see [`crate::cache::generations`].
pub const GENERATION_DIR_PREFIX: &str = "store_";

#[inline]
pub fn default_lazy_timeout() -> Duration {
    Duration::from_secs(DEFAULT_LAZY_TIMEOUT_SECS)
}

#[inline]
pub fn default_housekeeping_interval() -> Duration {
    Duration::from_secs(DEFAULT_HOUSEKEEPING_INTERVAL_SECS)
}
