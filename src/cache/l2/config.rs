use std::time::Duration;

use crate::constants::{
    DEFAULT_ENTITIES_PER_SEGMENT, default_housekeeping_interval, default_lazy_timeout,
};

/// Tuning for the durable tier.
#[derive(Debug, Clone)]
pub struct L2Config {
    /// Idle time after which a resident value is demoted to its on-disk form.
    pub lazy_timeout: Duration,
    /// Entries grouped into one lazily-loaded segment.
    pub entities_per_segment: usize,
    /// Interval between background demotion passes.
    pub housekeeping_interval: Duration,
}

impl Default for L2Config {
    fn default() -> Self {
        Self {
            lazy_timeout: default_lazy_timeout(),
            entities_per_segment: DEFAULT_ENTITIES_PER_SEGMENT,
            housekeeping_interval: default_housekeeping_interval(),
        }
    }
}

impl L2Config {
    pub fn lazy_timeout(mut self, timeout: Duration) -> Self {
        self.lazy_timeout = timeout;
        self
    }

    pub fn entities_per_segment(mut self, entities: usize) -> Self {
        self.entities_per_segment = entities.max(1);
        self
    }

    pub fn housekeeping_interval(mut self, interval: Duration) -> Self {
        self.housekeeping_interval = interval;
        self
    }
}
