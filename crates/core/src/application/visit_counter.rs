// Visit Counter - process-wide tally of catalogue listings

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic visit counter, constructed once and injected where needed
#[derive(Debug, Default)]
pub struct VisitCounter {
    count: AtomicU64,
}

impl VisitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one visit and return the new total
    pub fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
