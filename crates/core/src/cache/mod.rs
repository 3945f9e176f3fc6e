// Bounded side-caches in front of backing stores

pub mod lfu;

pub use lfu::{CacheKey, FrequencyBoundedCache, SharedCache};

use std::num::NonZeroUsize;

/// Default capacity of the showtime side-cache
pub const DEFAULT_SHOWTIME_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(capacity) => capacity,
    None => unreachable!(),
};
