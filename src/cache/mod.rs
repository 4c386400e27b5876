//! L1 memory tier, L2 durable tier and the two-tier cache composing them.

pub mod builder;
pub mod generations;
pub mod l1;
pub mod l2;
pub mod tiered;
pub mod types;

#[cfg(test)]
mod tiered_tests;

pub use builder::{CacheBuilder, builder};
pub use l1::L1Cache;
pub use l2::{DurableTier, L2Config, LazyValue, ReclaimReport};
pub use tiered::TwoTierCache;
pub use types::{TierStatus, TieredLookupResult};
