/// Counts reported by the durable tier's reclaim passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReclaimReport {
    /// Resident values demoted to their on-disk form.
    pub demoted: usize,
    /// Unfinished `*.tmp` entry writes deleted.
    pub temp_files_removed: usize,
    /// Empty segment directories deleted.
    pub segments_removed: usize,
}

impl ReclaimReport {
    /// Returns `true` if the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}
