use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::STORAGE_FORMAT_VERSION;
use crate::storage::error::{StorageError, StorageResult};

/// Contents of `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// On-disk format version.
    pub format_version: u32,
    /// Name of the cache that last opened the directory.
    pub name: String,
}

impl Manifest {
    /// Creates a manifest for the current format.
    pub fn new(name: &str) -> Self {
        Self {
            format_version: STORAGE_FORMAT_VERSION,
            name: name.to_string(),
        }
    }

    /// Reads the manifest at `path`, creating it if missing.
    ///
    /// The stored name is rewritten when the directory is reopened under another name.
    pub fn load_or_create(path: &Path, name: &str) -> StorageResult<Self> {
        let existing = match fs::read(path) {
            Ok(bytes) => Some(serde_json::from_slice::<Manifest>(&bytes).map_err(|e| {
                StorageError::Corrupt {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            })?),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        match existing {
            Some(manifest) if manifest.format_version != STORAGE_FORMAT_VERSION => {
                Err(StorageError::IncompatibleFormat {
                    found: manifest.format_version,
                    expected: STORAGE_FORMAT_VERSION,
                })
            }
            Some(manifest) if manifest.name == name => Ok(manifest),
            Some(manifest) => {
                debug!(old = %manifest.name, new = %name, "renaming cache in manifest");
                let renamed = Self::new(name);
                renamed.write(path)?;
                Ok(renamed)
            }
            None => {
                let manifest = Self::new(name);
                manifest.write(path)?;
                Ok(manifest)
            }
        }
    }

    fn write(&self, path: &Path) -> StorageResult<()> {
        let bytes =
            serde_json::to_vec_pretty(self).map_err(|e| StorageError::Codec(e.to_string()))?;
        fs::write(path, bytes)?;
        Ok(())
    }
}
