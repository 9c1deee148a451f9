// SPDX-License-Identifier: AGPL-3.0-or-later
//! Stat caching for sagfs plugins
//!
//! Records are keyed by backend-native path and only leave the cache through
//! explicit invalidation. There is no TTL and no size bound.

use std::collections::HashMap;
use tracing::trace;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub invalidations: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 { 0.0 } else { self.hit_count as f64 / total as f64 }
    }
}

/// Backend path to stat record
#[derive(Debug, Clone)]
pub struct StatCache<V> {
    entries: HashMap<String, V>,
    hit_count: u64,
    miss_count: u64,
    invalidations: u64,
}

impl<V: Clone> StatCache<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            hit_count: 0,
            miss_count: 0,
            invalidations: 0,
        }
    }

    /// Cached record for `path`, counting the lookup as a hit or miss.
    pub fn get(&mut self, path: &str) -> Option<V> {
        match self.entries.get(path) {
            Some(v) => {
                self.hit_count += 1;
                Some(v.clone())
            }
            None => {
                self.miss_count += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, path: impl Into<String>, value: V) {
        self.entries.insert(path.into(), value);
    }

    /// Remove exactly `path`.
    pub fn invalidate(&mut self, path: &str) -> bool {
        self.invalidations += 1;
        let removed = self.entries.remove(path).is_some();
        trace!(path, removed, "stat cache invalidate");
        removed
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.invalidations += 1;
        trace!(entries = self.entries.len(), "stat cache clear");
        self.entries.clear();
    }

    /// `clear_cache` semantics: one path, or all when `None`.
    pub fn invalidate_path_or_all(&mut self, path: Option<&str>) {
        match path {
            Some(path) => {
                self.invalidate(path);
            }
            None => self.clear(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hit_count: self.hit_count,
            miss_count: self.miss_count,
            invalidations: self.invalidations,
        }
    }
}

impl<V: Clone> Default for StatCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
