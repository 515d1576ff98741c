// src/utils/cache.rs
//! Bounded in-memory cache.
//!
//! Replaces the platform cache primitives used elsewhere with an explicit
//! abstraction: capacity is injected at construction and the oldest entry is
//! evicted first once the cache is full. Used for credential lookups and
//! proof verification results.

use std::collections::{HashMap, VecDeque};

/// A string-keyed cache with a fixed capacity and FIFO eviction.
#[derive(Debug)]
pub struct Cache<V> {
    capacity: usize,
    entries: HashMap<String, V>,
    order: VecDeque<String>,
}

impl<V> Cache<V> {
    /// Creates an empty cache holding at most `capacity` entries.
    /// A capacity of zero disables caching entirely.
    pub fn new(capacity: usize) -> Self {
        Cache {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Looks up a cached value.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Inserts a value, evicting the oldest entry when the cache is full.
    /// Re-inserting an existing key replaces the value in place.
    pub fn insert(&mut self, key: String, value: V) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.contains_key(&key) {
            self.entries.insert(key, value);
            return;
        }
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut cache = Cache::new(4);
        cache.insert("k".to_string(), 7u32);
        assert_eq!(cache.get("k"), Some(&7));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let mut cache = Cache::new(2);
        cache.insert("a".to_string(), 1u32);
        cache.insert("b".to_string(), 2);
        cache.insert("c".to_string(), 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(&2));
        assert_eq!(cache.get("c"), Some(&3));
    }

    #[test]
    fn test_reinsert_replaces_value() {
        let mut cache = Cache::new(2);
        cache.insert("a".to_string(), 1u32);
        cache.insert("a".to_string(), 9);
        assert_eq!(cache.get("a"), Some(&9));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_capacity_disables_caching() {
        let mut cache = Cache::new(0);
        cache.insert("a".to_string(), 1u32);
        assert!(cache.is_empty());
    }
}
