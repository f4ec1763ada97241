//! flipcache Library
//!
//! Asset delivery and caching for interactive flipbook catalogs: a bounded
//! in-memory image cache, a background preloader, an on-disk persistent
//! cache, the catalog loading state machine and percent/pixel hotspot
//! projection.

pub mod config;
pub mod fetch;
pub mod geometry;
pub mod image_cache;
pub mod loader;
pub mod logging;
pub mod metadata;
pub mod persistent;
pub mod preloader;
pub mod viewer;

pub use config::Config;
pub use fetch::{CancelToken, FetchError, Fetcher, HttpFetcher};
pub use geometry::{PercentRect, PixelRect, Size};
pub use image_cache::{ImageHandle, ImageMemoryCache};
pub use loader::{CatalogLoader, LoadingStateMachine};
pub use metadata::{HttpMetadataProvider, MetadataProvider};
pub use persistent::{DiskAssetStore, PersistentCacheClient};
pub use preloader::BackgroundPreloader;
pub use viewer::ViewerController;
