//! On-disk persistence for the durable tier (record codec and segment store).

pub mod codec;
pub mod disk;
pub mod error;

pub use disk::{DiskHandle, Manifest, SegmentStore, StorageStats};
pub use error::{StorageError, StorageResult};
