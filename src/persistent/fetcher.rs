//! Fetcher that reads and writes through the persistent store.

use std::sync::Arc;

use tracing::{debug, trace};

use super::store::{CacheKind, DiskAssetStore};
use crate::fetch::{CancelToken, FetchError, Fetcher};

/// Wraps a network fetcher with the persistent store.
///
/// - page images: cache first, network fallback, successful bodies stored
/// - API responses: network first, stored copy served when the network fails
///
/// [`Fetcher::fetch_api`] always takes the API route.
///
/// Store errors never fail a fetch; the asset is simply not persisted.
pub struct CacheFirstFetcher<F> {
    inner: F,
    store: Arc<DiskAssetStore>,
}

impl<F: Fetcher> CacheFirstFetcher<F> {
    pub fn new(inner: F, store: Arc<DiskAssetStore>) -> Self {
        Self { inner, store }
    }

    fn cached(&self, kind: CacheKind, url: &str) -> Option<Vec<u8>> {
        self.store.get_in(kind, url).unwrap_or_else(|e| {
            debug!(url = %url, error = %e, "persistent cache read failed");
            None
        })
    }

    fn write_through(&self, kind: CacheKind, url: &str, bytes: &[u8]) {
        if let Err(e) = self.store.put_in(kind, url, bytes) {
            debug!(url = %url, error = %e, "persistent cache write failed");
        }
    }

    fn cache_first(&self, url: &str, cancel: &CancelToken) -> Result<Vec<u8>, FetchError> {
        if let Some(bytes) = self.cached(CacheKind::Flipbook, url) {
            trace!(url = %url, "served from persistent cache");
            return Ok(bytes);
        }
        let bytes = self.inner.fetch(url, cancel)?;
        self.write_through(CacheKind::Flipbook, url, &bytes);
        Ok(bytes)
    }

    fn network_first(&self, url: &str, cancel: &CancelToken) -> Result<Vec<u8>, FetchError> {
        match self.inner.fetch(url, cancel) {
            Ok(bytes) => {
                self.write_through(CacheKind::Api, url, &bytes);
                Ok(bytes)
            }
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => match self.cached(CacheKind::Api, url) {
                Some(bytes) => {
                    debug!(url = %url, error = %e, "network failed, serving stale copy");
                    Ok(bytes)
                }
                None => Err(e),
            },
        }
    }
}

impl<F: Fetcher> Fetcher for CacheFirstFetcher<F> {
    fn fetch(&self, url: &str, cancel: &CancelToken) -> Result<Vec<u8>, FetchError> {
        cancel.check()?;
        match CacheKind::for_url(url) {
            CacheKind::Flipbook => self.cache_first(url, cancel),
            CacheKind::Api => self.network_first(url, cancel),
        }
    }

    fn fetch_api(&self, url: &str, cancel: &CancelToken) -> Result<Vec<u8>, FetchError> {
        cancel.check()?;
        self.network_first(url, cancel)
    }
}
