use alloc::collections::VecDeque;
use core::num::NonZeroUsize;
use std::collections::HashMap;

/// The key of a color in a [`LookupCache`]: each component floored to an integer.
pub type CacheKey = [i32; 4];

/// Returns the [`CacheKey`] of a color with fractional components.
///
/// Distinct colors that floor to the same integers share a key.
#[inline]
pub fn cache_key(color: [f32; 4]) -> CacheKey {
    #[allow(clippy::cast_possible_truncation)]
    color.map(|c| c.floor() as i32)
}

/// A bounded map from [`CacheKey`]s to palette indices with first in, first out eviction.
///
/// Once the cache is full, inserting a new key evicts the key that was inserted first.
/// Lookups do not affect the eviction order.
#[derive(Debug, Clone)]
pub struct LookupCache {
    /// The resolved palette index of each cached key.
    map: HashMap<CacheKey, usize>,
    /// The cached keys in insertion order.
    order: VecDeque<CacheKey>,
    /// The maximum number of cached keys.
    capacity: NonZeroUsize,
}

impl LookupCache {
    /// Create a new, empty [`LookupCache`] holding at most `capacity` keys.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    /// Returns the maximum number of cached keys.
    #[inline]
    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Returns the number of cached keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns whether the cache is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the cached palette index for `key`.
    #[inline]
    pub fn get(&self, key: &CacheKey) -> Option<usize> {
        self.map.get(key).copied()
    }

    /// Cache `index` for `key` unless `key` is already cached.
    pub fn insert(&mut self, key: CacheKey, index: usize) {
        if self.map.contains_key(&key) {
            return;
        }
        self.map.insert(key, index);
        self.order.push_back(key);
        if self.order.len() > self.capacity.get() {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
    }

    /// Remove all cached keys.
    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }
}

/// Lookup counts of a [`Resolver`](super::Resolver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LookupStats {
    /// The number of lookups answered from the cache.
    pub hits: u64,
    /// The total number of lookups.
    pub lookups: u64,
}

impl LookupStats {
    /// Returns the number of lookups that needed a palette scan.
    #[inline]
    pub fn misses(&self) -> u64 {
        self.lookups - self.hits
    }

    /// Returns the fraction of lookups answered from the cache,
    /// or `None` if there have been no lookups.
    #[inline]
    pub fn hit_rate(&self) -> Option<f32> {
        #[allow(clippy::cast_precision_loss)]
        (self.lookups > 0).then(|| self.hits as f32 / self.lookups as f32)
    }
}
