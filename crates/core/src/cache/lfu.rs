// LFU (least-frequently-used) bounded cache keyed by entity id

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Cache key (entity identifier)
pub type CacheKey = u64;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    frequency: u64,
}

/// Capacity-bounded key -> value store evicting the least frequently accessed entry
///
/// - `get` is not a pure read: a hit bumps the entry's frequency.
/// - `put` on an existing key replaces the value and bumps the frequency
///   (never resets it, never evicts).
/// - `put` on a new key while full evicts exactly one entry first: the one with the
///   lowest frequency, ties broken by the lowest key.
///
/// Eviction scans every entry (O(n)); capacities are expected to stay small.
/// Not synchronized: wrap it in [`SharedCache`] for concurrent callers.
#[derive(Debug)]
pub struct FrequencyBoundedCache<V> {
    name: &'static str,
    capacity: NonZeroUsize,
    entries: HashMap<CacheKey, CacheEntry<V>>,
}

impl<V> FrequencyBoundedCache<V> {
    /// Create an empty cache
    ///
    /// # Arguments
    /// * `name` - Label used in log events (e.g. "showtime")
    /// * `capacity` - Maximum number of entries, fixed for the cache's lifetime
    pub fn new(name: &'static str, capacity: NonZeroUsize) -> Self {
        Self {
            name,
            capacity,
            entries: HashMap::with_capacity(capacity.get()),
        }
    }

    /// Look up `key`, incrementing its frequency on a hit
    pub fn get(&mut self, key: CacheKey) -> Option<&V> {
        let entry = self.entries.get_mut(&key)?;
        entry.frequency = entry.frequency.saturating_add(1);
        debug!(
            cache = self.name,
            key,
            frequency = entry.frequency,
            "Cache hit"
        );
        Some(&entry.value)
    }

    /// Insert or replace the value for `key`
    pub fn put(&mut self, key: CacheKey, value: V) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            entry.frequency = entry.frequency.saturating_add(1);
            debug!(
                cache = self.name,
                key,
                frequency = entry.frequency,
                "Cache entry updated"
            );
            return;
        }

        if self.entries.len() >= self.capacity.get() {
            self.evict_least_frequent();
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                frequency: 1,
            },
        );
        debug!(cache = self.name, key, "Cache entry inserted");
    }

    /// Drop the entry for `key`, returning its value if it was present
    pub fn remove(&mut self, key: CacheKey) -> Option<V> {
        let entry = self.entries.remove(&key)?;
        debug!(cache = self.name, key, "Cache entry removed");
        Some(entry.value)
    }

    pub fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        info!(cache = self.name, dropped, "Cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Presence check without touching the frequency
    pub fn contains_key(&self, key: CacheKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Current access frequency of `key`, without touching it
    pub fn frequency(&self, key: CacheKey) -> Option<u64> {
        self.entries.get(&key).map(|entry| entry.frequency)
    }

    fn evict_least_frequent(&mut self) -> Option<(CacheKey, u64)> {
        let (key, frequency) = self
            .entries
            .iter()
            .map(|(key, entry)| (*key, entry.frequency))
            .min_by_key(|&(key, frequency)| (frequency, key))?;

        self.entries.remove(&key);
        info!(cache = self.name, key, frequency, "Cache entry evicted");
        Some((key, frequency))
    }
}

/// Mutex-guarded [`FrequencyBoundedCache`] for use from concurrent request handlers
///
/// Each operation holds the lock for its whole duration, so the frequency bump in
/// `get` and the eviction in `put` are never interleaved with other callers.
#[derive(Debug)]
pub struct SharedCache<V> {
    inner: Mutex<FrequencyBoundedCache<V>>,
}

impl<V: Clone> SharedCache<V> {
    pub fn new(name: &'static str, capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(FrequencyBoundedCache::new(name, capacity)),
        }
    }

    pub fn get(&self, key: CacheKey) -> Option<V> {
        self.lock().get(key).cloned()
    }

    pub fn put(&self, key: CacheKey, value: V) {
        self.lock().put(key, value);
    }

    pub fn remove(&self, key: CacheKey) -> Option<V> {
        self.lock().remove(key)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn frequency(&self, key: CacheKey) -> Option<u64> {
        self.lock().frequency(key)
    }

    // A panic while holding the lock cannot leave an entry half-written, so a
    // poisoned cache is still consistent.
    fn lock(&self) -> MutexGuard<'_, FrequencyBoundedCache<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
