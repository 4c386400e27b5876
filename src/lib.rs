//! Strata: a two-tier, disk-persisted key/value cache.
//!
//! # Public API Surface
//!
//! ## Core Types
//! - [`TwoTierCache`] - bounded LRU memory tier (L1) in front of a durable tier (L2)
//! - [`CacheBuilder`], [`builder`] - validated construction
//! - [`CacheError`], [`ConfigError`], [`StorageError`] - error types
//!
//! ## Tiers
//! - [`L1Cache`] - in-memory LRU tier
//! - [`DurableTier`], [`L2Config`] - crash-durable tier with lazily loaded values
//!
//! ## Configuration
//! - [`CacheConfig`] - defaults plus `STRATA_*` environment overrides
//!
//! # Example
//!
//! ```no_run
//! let cache = strata::builder("/var/cache/orders")
//!     .max_in_memory_entities(500)
//!     .build::<String, u64>()?;
//!
//! cache.put("order-1".to_string(), 42)?;
//! assert_eq!(cache.get(&"order-1".to_string())?, Some(42));
//! cache.shutdown();
//! # Ok::<(), strata::CacheError>(())
//! ```

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod hashing;
pub mod storage;

pub use cache::generations::{cleanup_before, generation_path};
pub use cache::{
    CacheBuilder, DurableTier, L1Cache, L2Config, ReclaimReport, TierStatus, TieredLookupResult,
    TwoTierCache, builder,
};
pub use config::{CacheConfig, ConfigError};
pub use error::{CacheError, CacheResult};
pub use storage::StorageError;
