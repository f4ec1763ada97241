//! In-memory image cache with LRU eviction
//!
//! Holds decoded page images keyed by URL, bounded by an approximate byte
//! budget and an entry budget. Instances are explicitly constructed and
//! shared with `Arc`; there is no process-wide cache.

pub mod cache;
pub mod clock;
pub mod handle;

pub use cache::{
    CacheEntry, CacheLimits, CacheOverflow, CacheStats, ImageMemoryCache, DEFAULT_MAX_BYTES,
    DEFAULT_MAX_ENTRIES,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use handle::{approx_byte_size, FetchingImageLoader, ImageHandle, ImageLoadError, ImageLoader};
