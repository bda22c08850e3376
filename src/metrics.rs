//! Operation counters, compiled in with the `metrics` feature.
//!
//! Counters are plain integers bumped on `&mut self` paths only, so they add
//! no synchronization and never change container behavior.

#[derive(Debug, Default, Clone)]
pub(crate) struct ContainerMetrics {
    pub(crate) insert_calls: u64,
    pub(crate) insert_new: u64,
    pub(crate) insert_existing: u64,
    pub(crate) insert_failed: u64,

    pub(crate) erase_calls: u64,
    pub(crate) erased_elements: u64,

    pub(crate) touch_calls: u64,
    pub(crate) touched_elements: u64,

    pub(crate) pop_oldest_calls: u64,
    pub(crate) pop_oldest_found: u64,

    pub(crate) rehashes: u64,
    pub(crate) clear_calls: u64,
}

impl ContainerMetrics {
    pub(crate) fn snapshot(&self, len: usize) -> ContainerMetricsSnapshot {
        ContainerMetricsSnapshot {
            insert_calls: self.insert_calls,
            insert_new: self.insert_new,
            insert_existing: self.insert_existing,
            insert_failed: self.insert_failed,
            erase_calls: self.erase_calls,
            erased_elements: self.erased_elements,
            touch_calls: self.touch_calls,
            touched_elements: self.touched_elements,
            pop_oldest_calls: self.pop_oldest_calls,
            pop_oldest_found: self.pop_oldest_found,
            rehashes: self.rehashes,
            clear_calls: self.clear_calls,
            len,
        }
    }
}

/// Point-in-time copy of a container's counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ContainerMetricsSnapshot {
    pub insert_calls: u64,
    pub insert_new: u64,
    pub insert_existing: u64, // unique inserts that found the key present
    pub insert_failed: u64,

    pub erase_calls: u64,
    pub erased_elements: u64,

    pub touch_calls: u64,
    pub touched_elements: u64,

    pub pop_oldest_calls: u64,
    pub pop_oldest_found: u64,

    pub rehashes: u64, // bucket array restructures, automatic or requested
    pub clear_calls: u64,

    // gauge captured at snapshot time
    pub len: usize,
}
