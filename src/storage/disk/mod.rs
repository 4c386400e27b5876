//! Segment-grouped, file-per-entry durable store.
//!
//! Layout under the storage root:
//!
//! ```text
//! .lock                     exclusive ownership marker (OS advisory lock)
//! manifest.json             format version + cache name
//! segments/00000000/<fingerprint>.entry
//! segments/00000001/<fingerprint>.entry
//! ```
//!
//! Every write goes to `<fingerprint>.entry.tmp`, is synced, then renamed over the final
//! name, so a single entry is either fully old or fully new after a crash.

/// Manifest model.
pub mod manifest;


pub use manifest::Manifest;

use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::codec;
use super::error::{StorageError, StorageResult};
use crate::constants::{
    ENTRY_EXTENSION, LOCK_FILE_NAME, MANIFEST_FILE_NAME, SEGMENTS_DIR_NAME, TEMP_EXTENSION,
};

/// Location of one entry file: its segment and its key fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiskHandle {
    segment: u64,
    fingerprint: String,
}

impl DiskHandle {
    /// Creates a handle for `fingerprint` inside `segment`.
    pub fn new(segment: u64, fingerprint: impl Into<String>) -> Self {
        Self {
            segment,
            fingerprint: fingerprint.into(),
        }
    }

    /// Segment id.
    #[inline]
    pub fn segment(&self) -> u64 {
        self.segment
    }

    /// Key fingerprint (file stem).
    #[inline]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

#[derive(Debug)]
/// Exclusive, crash-durable store of framed entry records.
pub struct SegmentStore {
    root: PathBuf,
    segments_path: PathBuf,
    manifest: Manifest,
    lock: Mutex<Option<File>>,
}

impl SegmentStore {
    /// Opens (or creates) the store rooted at `root` and takes its exclusive lock.
    ///
    /// Fails with [`StorageError::Locked`] when another open store holds the directory,
    /// whether in this process or another one.
    pub fn open(root: &Path, name: &str) -> StorageResult<Self> {
        fs::create_dir_all(root)?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(root.join(LOCK_FILE_NAME))?;
        match lock_file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(StorageError::Locked {
                    path: root.to_path_buf(),
                });
            }
            Err(TryLockError::Error(e)) => return Err(StorageError::Io(e)),
        }

        let segments_path = root.join(SEGMENTS_DIR_NAME);
        fs::create_dir_all(&segments_path)?;
        sync_dir(root)?;

        let manifest = Manifest::load_or_create(&root.join(MANIFEST_FILE_NAME), name)?;

        let store = Self {
            root: root.to_path_buf(),
            segments_path,
            manifest,
            lock: Mutex::new(Some(lock_file)),
        };

        let stray = store.remove_stray_temp_files()?;
        if stray > 0 {
            info!(path = %root.display(), stray, "discarded unfinished entry writes");
        }

        Ok(store)
    }

    /// Returns the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the manifest read (or written) at open time.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Returns `true` while the exclusive lock is held.
    pub fn is_locked(&self) -> bool {
        self.lock.lock().is_some()
    }

    /// Releases the exclusive lock (idempotent).
    pub fn release(&self) {
        if let Some(file) = self.lock.lock().take() {
            if let Err(e) = file.unlock() {
                warn!(path = %self.root.display(), error = %e, "failed to unlock storage directory");
            }
            debug!(path = %self.root.display(), "storage lock released");
        }
    }

    fn segment_path(&self, segment: u64) -> PathBuf {
        self.segments_path.join(format!("{:08}", segment))
    }

    /// Path of the committed entry file for `handle`.
    pub fn entry_path(&self, handle: &DiskHandle) -> PathBuf {
        self.segment_path(handle.segment)
            .join(format!("{}.{}", handle.fingerprint, ENTRY_EXTENSION))
    }

    fn temp_entry_path(&self, handle: &DiskHandle) -> PathBuf {
        self.segment_path(handle.segment).join(format!(
            "{}.{}.{}",
            handle.fingerprint, ENTRY_EXTENSION, TEMP_EXTENSION
        ))
    }

    /// Durably writes `bytes` as the entry for `handle`, replacing any previous contents.
    ///
    /// The entry file and its segment directory are both synced before returning, so a
    /// confirmed write survives a crash.
    pub fn write(&self, handle: &DiskHandle, bytes: &[u8]) -> StorageResult<()> {
        let segment_path = self.segment_path(handle.segment);
        if !segment_path.is_dir() {
            fs::create_dir_all(&segment_path)?;
            sync_dir(&self.segments_path)?;
        }

        let temp_path = self.temp_entry_path(handle);
        let final_path = self.entry_path(handle);

        {
            let mut file = File::create(&temp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &final_path)?;
        sync_dir(&segment_path)?;
        Ok(())
    }

    /// Reads the full framed record of `handle`.
    pub fn read(&self, handle: &DiskHandle) -> StorageResult<Vec<u8>> {
        Ok(fs::read(self.entry_path(handle))?)
    }

    /// Reads only the encoded key of `handle`.
    pub fn read_key_bytes(&self, handle: &DiskHandle) -> StorageResult<Vec<u8>> {
        let path = self.entry_path(handle);
        let mut file = File::open(&path)?;
        let file_len = file.metadata()?.len() as usize;

        let key_bytes = codec::read_key_prefix(&mut file, file_len).map_err(|e| match e {
            StorageError::Io(io) if io.kind() == ErrorKind::UnexpectedEof => {
                StorageError::Corrupt {
                    path: path.clone(),
                    reason: format!("truncated key header in {} byte file", file_len),
                }
            }
            StorageError::Codec(reason) => StorageError::Corrupt {
                path: path.clone(),
                reason,
            },
            other => other,
        })?;
        Ok(key_bytes)
    }

    /// Deletes the entry for `handle`. Returns `false` if it did not exist.
    ///
    /// The segment directory is synced so the removal survives a crash.
    pub fn delete(&self, handle: &DiskHandle) -> StorageResult<bool> {
        match fs::remove_file(self.entry_path(handle)) {
            Ok(()) => {
                sync_dir(&self.segment_path(handle.segment))?;
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns `true` if an entry file exists for `handle`.
    pub fn exists(&self, handle: &DiskHandle) -> bool {
        self.entry_path(handle).exists()
    }

    /// Lists segment ids present on disk, ascending.
    pub fn list_segments(&self) -> StorageResult<Vec<u64>> {
        let mut segments = Vec::new();

        for entry in fs::read_dir(&self.segments_path)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir()
                && let Some(name) = path.file_name()
                && let Some(name_str) = name.to_str()
                && let Ok(id) = name_str.parse::<u64>()
            {
                segments.push(id);
            } else {
                debug!(path = %path.display(), "ignoring unexpected item in segments directory");
            }
        }

        segments.sort_unstable();
        Ok(segments)
    }

    /// Lists committed entries of `segment`.
    pub fn list_entries(&self, segment: u64) -> StorageResult<Vec<DiskHandle>> {
        let segment_path = self.segment_path(segment);
        if !segment_path.exists() {
            return Ok(Vec::new());
        }

        let mut handles = Vec::new();
        for entry in fs::read_dir(&segment_path)? {
            let path = entry?.path();

            if let Some(ext) = path.extension()
                && ext == ENTRY_EXTENSION
                && let Some(stem) = path.file_stem()
                && let Some(stem_str) = stem.to_str()
            {
                handles.push(DiskHandle::new(segment, stem_str));
            }
        }

        Ok(handles)
    }

    /// Lists every committed entry, grouped by ascending segment id.
    pub fn scan(&self) -> StorageResult<Vec<DiskHandle>> {
        let mut handles = Vec::new();
        for segment in self.list_segments()? {
            handles.extend(self.list_entries(segment)?);
        }
        Ok(handles)
    }

    /// Deletes every segment. The lock and manifest are kept.
    pub fn clear(&self) -> StorageResult<()> {
        let result = self
            .list_segments()?
            .into_iter()
            .try_for_each(|segment| fs::remove_dir_all(self.segment_path(segment)));
        sync_dir(&self.segments_path)?;
        Ok(result?)
    }

    /// Returns `true` if the directory of `segment` exists.
    pub fn segment_exists(&self, segment: u64) -> bool {
        self.segment_path(segment).is_dir()
    }

    /// Deletes `*.tmp` files left behind by interrupted writes and returns the count.
    pub fn remove_stray_temp_files(&self) -> StorageResult<usize> {
        let mut removed = 0;

        for segment in self.list_segments()? {
            for entry in fs::read_dir(self.segment_path(segment))? {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == TEMP_EXTENSION) {
                    fs::remove_file(&path)?;
                    removed += 1;
                }
            }
        }

        Ok(removed)
    }

    /// Removes empty segment directories and returns the count removed.
    pub fn remove_empty_segments(&self) -> StorageResult<usize> {
        let mut removed = 0;

        for segment in self.list_segments()? {
            let path = self.segment_path(segment);
            let is_empty = fs::read_dir(&path)?.next().is_none();

            if is_empty {
                fs::remove_dir(&path)?;
                removed += 1;
            }
        }

        if removed > 0 {
            sync_dir(&self.segments_path)?;
        }
        Ok(removed)
    }

    /// Returns basic storage stats by scanning the directory tree.
    pub fn stats(&self) -> StorageResult<StorageStats> {
        let segments = self.list_segments()?;
        let mut entry_count = 0;
        let mut total_bytes = 0;

        for segment in &segments {
            for handle in self.list_entries(*segment)? {
                entry_count += 1;
                if let Ok(metadata) = fs::metadata(self.entry_path(&handle)) {
                    total_bytes += metadata.len();
                }
            }
        }

        Ok(StorageStats {
            segment_count: segments.len(),
            entry_count,
            total_bytes,
        })
    }
}

/// Flushes directory metadata (created, renamed and removed names) to disk.
#[cfg(unix)]
fn sync_dir(path: &Path) -> io::Result<()> {
    File::open(path)?.sync_all()
}

/// Directory handles cannot be synced on this platform; renames are flushed by the OS.
#[cfg(not(unix))]
fn sync_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

impl Drop for SegmentStore {
    fn drop(&mut self) {
        self.release();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Aggregate stats for the segment store.
pub struct StorageStats {
    /// Number of segment directories.
    pub segment_count: usize,
    /// Total number of committed entry files.
    pub entry_count: usize,
    /// Total bytes across all entry files.
    pub total_bytes: u64,
}
