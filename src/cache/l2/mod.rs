//! L2 durable tier: segment store adapter with lazy values and housekeeping.

pub mod config;
pub mod durable;
pub mod housekeeping;
pub mod lazy;
pub mod types;


pub use config::L2Config;
pub use durable::DurableTier;
pub use lazy::LazyValue;
pub use types::ReclaimReport;
