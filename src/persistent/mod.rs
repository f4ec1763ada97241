//! Persistent asset cache
//!
//! A versioned, on-disk cache that outlives the in-memory image cache.
//! Network fetches made through [`CacheFirstFetcher`] populate it
//! transparently; the [`PersistentCacheClient`] drives it with the
//! message protocol in [`protocol`] (pre-cache URLs, clear, report status).
//!
//! The cache is optional. When it cannot be opened, callers use
//! [`PersistentCacheClient::absent`] and the plain network fetcher, and
//! nothing is reported to the user.

pub mod client;
pub mod fetcher;
pub mod protocol;
pub mod service;
pub mod store;

pub use client::PersistentCacheClient;
pub use fetcher::CacheFirstFetcher;
pub use protocol::{CacheCommand, CacheReply};
pub use service::PersistentCacheService;
pub use store::{CacheKind, DiskAssetStore, CACHE_FAMILY_PREFIX, DEFAULT_VERSION};
