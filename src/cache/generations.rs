//! Numbered store directories.
//!
//! A caller that rebuilds its cache from scratch can open `store_<n + 1>` next to the
//! live `store_<n>` and drop the older generations once the new one is in use.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::constants::GENERATION_DIR_PREFIX;

/// Directory for generation `n` under `root`.
pub fn generation_path(root: &Path, n: u64) -> PathBuf {
    root.join(format!("{}{}", GENERATION_DIR_PREFIX, n))
}

/// Deletes every generation `m` with `0 < m < n` under `root`.
///
/// Missing generations are skipped. Failures are logged and do not stop the sweep.
/// Returns the number of directories deleted.
pub fn cleanup_before(root: &Path, n: u64) -> usize {
    let mut removed = 0;
    for m in 1..n {
        let path = generation_path(root, m);
        if !path.is_dir() {
            continue;
        }
        match fs::remove_dir_all(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed old generation");
                removed += 1;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove old generation");
            }
        }
    }
    removed
}
