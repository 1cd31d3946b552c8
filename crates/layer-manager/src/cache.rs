//! Decode cache keyed by source path.
//!
//! Entries are immutable layer sets shared through `Arc`: a second load of
//! the same path hands back the very same handles, so a gradient applied
//! through one handle is seen through every other.

use raster_common::RasterLayer;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Shared, mutable reference to one layer.
pub type LayerHandle = Arc<RwLock<RasterLayer>>;

/// The layers decoded from one source path, in build order.
pub type LayerSet = Arc<Vec<LayerHandle>>;

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Full decodes performed on behalf of the cache.
    pub decodes: u64,
    pub entries: usize,
    /// Normalized samples held across all cached layers.
    pub cached_samples: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    decodes: AtomicU64,
}

/// Path-keyed cache of decoded layer sets. Cloning shares the cache.
#[derive(Debug, Clone, Default)]
pub struct LayerCache {
    entries: Arc<RwLock<HashMap<PathBuf, LayerSet>>>,
    counters: Arc<Counters>,
}

impl LayerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached set for `path`, counting the lookup as a hit or miss.
    pub fn get(&self, path: &Path) -> Option<LayerSet> {
        let found = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned();
        let counter = if found.is_some() {
            &self.counters.hits
        } else {
            &self.counters.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Wrap and store freshly built layers.
    ///
    /// If another caller cached `path` first, that entry wins and is
    /// returned so every caller observes a single set of handles.
    pub fn insert(&self, path: &Path, layers: Vec<RasterLayer>) -> LayerSet {
        let set: LayerSet = Arc::new(layers.into_iter().map(|l| Arc::new(RwLock::new(l))).collect());
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let stored = entries.entry(path.to_path_buf()).or_insert_with(|| set.clone());
        if !Arc::ptr_eq(stored, &set) {
            debug!(path = %path.display(), "Cache entry already present, keeping existing layers");
        }
        stored.clone()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(path)
    }

    /// Drop the entry for `path`, returning it if present.
    pub fn remove(&self, path: &Path) -> Option<LayerSet> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(path)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn record_decode(&self) {
        self.counters.decodes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let cached_samples = entries
            .values()
            .flat_map(|set| set.iter())
            .map(|handle| handle.read().unwrap_or_else(|e| e.into_inner()).pixel_count())
            .sum();
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            decodes: self.counters.decodes.load(Ordering::Relaxed),
            entries: entries.len(),
            cached_samples,
        }
    }
}
