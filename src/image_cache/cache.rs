//! Byte- and count-bounded LRU cache of decoded images
//!
//! Every mutation happens under one mutex, so the byte total tracked by the
//! cache always equals the sum of its entries, and both budgets hold whenever
//! the lock is released. Network work in `preload` happens outside the lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::handle::{ImageHandle, ImageLoadError, ImageLoader};

/// Default byte budget (50 MiB).
pub const DEFAULT_MAX_BYTES: u64 = 50 * 1024 * 1024;

/// Default entry budget.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Budgets for an [`ImageMemoryCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    pub max_bytes: u64,
    pub max_entries: usize,
}

impl CacheLimits {
    /// `max_entries` is raised to at least one.
    pub fn new(max_bytes: u64, max_entries: usize) -> Self {
        Self {
            max_bytes,
            max_entries: max_entries.max(1),
        }
    }

    pub fn from_megabytes(max_size_mb: f64, max_entries: usize) -> Self {
        let bytes = (max_size_mb.max(0.0) * 1024.0 * 1024.0) as u64;
        Self::new(bytes, max_entries)
    }
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BYTES, DEFAULT_MAX_ENTRIES)
    }
}

/// A single image rejected because it alone exceeds the byte budget.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Image too large to cache: {url} ({size_bytes} bytes, budget {max_bytes} bytes)")]
pub struct CacheOverflow {
    pub url: String,
    pub size_bytes: u64,
    pub max_bytes: u64,
}

/// One cached image.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub url: String,
    pub image: ImageHandle,
    /// Clock reading of the last insert or hit
    pub last_access: u64,
    pub approx_byte_size: u64,
    /// Insertion sequence, breaks `last_access` ties
    seq: u64,
}

impl CacheEntry {
    fn lru_key(&self) -> (u64, u64) {
        (self.last_access, self.seq)
    }
}

/// Read-only snapshot of cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub size_bytes: u64,
    pub max_bytes: u64,
    pub max_entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of `get` calls that hit, `None` before the first lookup.
    pub fn hit_rate(&self) -> Option<f64> {
        let lookups = self.hits + self.misses;
        (lookups > 0).then(|| self.hits as f64 / lookups as f64)
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// (last_access, seq) -> url; first key is the eviction candidate
    lru: BTreeMap<(u64, u64), String>,
    size_bytes: u64,
    next_seq: u64,
    hits: u64,
    misses: u64,
}

impl CacheState {
    fn remove(&mut self, url: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(url)?;
        self.lru.remove(&entry.lru_key());
        self.size_bytes -= entry.approx_byte_size;
        Some(entry)
    }

    fn evict_lru(&mut self) -> Option<CacheEntry> {
        let (_, url) = self.lru.pop_first()?;
        let entry = self.entries.remove(&url)?;
        self.size_bytes -= entry.approx_byte_size;
        Some(entry)
    }
}

/// In-process image cache bounded by bytes and entry count.
///
/// Construct one per viewer session and share it behind an `Arc`; all
/// methods take `&self`.
pub struct ImageMemoryCache {
    state: Mutex<CacheState>,
    limits: CacheLimits,
    clock: Box<dyn Clock>,
}

impl ImageMemoryCache {
    pub fn new(limits: CacheLimits) -> Self {
        Self::with_clock(limits, SystemClock::new())
    }

    /// Create a cache that stamps accesses with `clock`.
    pub fn with_clock(limits: CacheLimits, clock: impl Clock + 'static) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            limits,
            clock: Box::new(clock),
        }
    }

    pub fn limits(&self) -> CacheLimits {
        self.limits
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Look up an image and refresh its LRU position. Never performs I/O.
    pub fn get(&self, url: &str) -> Option<ImageHandle> {
        let now = self.clock.now_millis();
        let mut state = self.lock();
        let state = &mut *state;

        let Some(entry) = state.entries.get_mut(url) else {
            state.misses += 1;
            return None;
        };

        state.lru.remove(&entry.lru_key());
        entry.last_access = now;
        state.lru.insert(entry.lru_key(), entry.url.clone());
        state.hits += 1;
        Some(entry.image.clone())
    }

    /// Whether `url` is cached. Does not touch LRU order.
    pub fn has(&self, url: &str) -> bool {
        self.lock().entries.contains_key(url)
    }

    /// Insert an image, evicting least-recently-used entries as needed.
    ///
    /// An image larger than the whole byte budget is rejected and the cache
    /// is left untouched. Re-inserting a cached URL replaces the old entry.
    pub fn set(&self, url: &str, image: ImageHandle) -> Result<(), CacheOverflow> {
        let size = image.approx_byte_size();
        if size > self.limits.max_bytes {
            warn!(
                url = %url,
                size_bytes = size,
                max_bytes = self.limits.max_bytes,
                "image too large to cache"
            );
            return Err(CacheOverflow {
                url: url.to_string(),
                size_bytes: size,
                max_bytes: self.limits.max_bytes,
            });
        }

        let now = self.clock.now_millis();
        let mut state = self.lock();
        state.remove(url);

        while state.size_bytes + size > self.limits.max_bytes
            || state.entries.len() >= self.limits.max_entries
        {
            match state.evict_lru() {
                Some(evicted) => {
                    debug!(url = %evicted.url, bytes = evicted.approx_byte_size, "evicted")
                }
                None => break,
            }
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        let entry = CacheEntry {
            url: url.to_string(),
            image,
            last_access: now,
            approx_byte_size: size,
            seq,
        };
        state.lru.insert(entry.lru_key(), entry.url.clone());
        state.entries.insert(entry.url.clone(), entry);
        state.size_bytes += size;
        Ok(())
    }

    /// Remove one entry. Returns whether anything was removed.
    pub fn delete(&self, url: &str) -> bool {
        self.lock().remove(url).is_some()
    }

    /// Remove every entry. Hit/miss counters are kept.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.lru.clear();
        state.size_bytes = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            entries: state.entries.len(),
            size_bytes: state.size_bytes,
            max_bytes: self.limits.max_bytes,
            max_entries: self.limits.max_entries,
            hits: state.hits,
            misses: state.misses,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Cached URLs from least to most recently used.
    pub fn lru_order(&self) -> Vec<String> {
        self.lock().lru.values().cloned().collect()
    }

    /// Snapshot of one entry's bookkeeping, without refreshing it.
    pub fn entry(&self, url: &str) -> Option<CacheEntry> {
        self.lock().entries.get(url).cloned()
    }

    /// Return the cached image, or load it and cache it on success.
    ///
    /// A load failure leaves the cache unmodified. An image too large to
    /// cache is still returned to the caller.
    pub fn preload(
        &self,
        url: &str,
        loader: &dyn ImageLoader,
    ) -> Result<ImageHandle, ImageLoadError> {
        if let Some(cached) = self.get(url) {
            return Ok(cached);
        }

        let image = loader.load(url)?;
        if let Err(overflow) = self.set(url, image.clone()) {
            debug!(%overflow, "serving uncached image");
        }
        Ok(image)
    }

    /// Preload many URLs, isolating failures. Nothing is reported back.
    pub fn preload_batch(&self, urls: &[String], loader: &dyn ImageLoader) {
        urls.par_iter().for_each(|url| {
            if let Err(e) = self.preload(url, loader) {
                warn!(url = %e.url, reason = %e.reason, "preload failed");
            }
        });
    }
}

impl Default for ImageMemoryCache {
    fn default() -> Self {
        Self::new(CacheLimits::default())
    }
}
