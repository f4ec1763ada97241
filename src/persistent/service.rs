//! Service side of the persistent cache protocol.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::protocol::{CacheCommand, CacheReply};
use super::store::DiskAssetStore;
use crate::fetch::{CancelToken, Fetcher};
use crate::metadata::MetadataProvider;

/// A command plus the channel its reply (if any) goes to.
pub(crate) struct Envelope {
    pub(crate) command: CacheCommand,
    pub(crate) reply: Option<Sender<CacheReply>>,
}

/// Executes [`CacheCommand`]s against a [`DiskAssetStore`].
pub struct PersistentCacheService {
    store: Arc<DiskAssetStore>,
    fetcher: Arc<dyn Fetcher>,
    metadata: Option<Arc<dyn MetadataProvider>>,
}

impl PersistentCacheService {
    /// `fetcher` should hit the network directly; the service writes
    /// through to `store` itself.
    pub fn new(store: Arc<DiskAssetStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            store,
            fetcher,
            metadata: None,
        }
    }

    /// Provider used to resolve `PrecacheFirstPages`.
    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataProvider>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn store(&self) -> &Arc<DiskAssetStore> {
        &self.store
    }

    /// Execute one command. Only `GetCacheStatus` produces a reply.
    pub fn handle(&self, command: CacheCommand) -> Option<CacheReply> {
        match command {
            CacheCommand::CacheFlipbookPages { pages } => {
                self.cache_urls(&pages);
                None
            }
            CacheCommand::PrecacheFirstPages { catalog_id, count } => {
                self.precache_first_pages(&catalog_id, count);
                None
            }
            CacheCommand::ClearCache => {
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "failed to clear persistent cache");
                }
                None
            }
            CacheCommand::GetCacheStatus => {
                let payload = self.store.status().unwrap_or_else(|e| {
                    warn!(error = %e, "failed to read persistent cache status");
                    Default::default()
                });
                Some(CacheReply::CacheStatus { payload })
            }
        }
    }

    /// Fetch and store every URL not already cached. Failures are isolated.
    /// Returns the number newly stored.
    pub fn cache_urls(&self, urls: &[String]) -> usize {
        let token = CancelToken::new();
        let stored = urls
            .par_iter()
            .filter(|url| !self.store.contains(url))
            .filter(|url| match self.fetcher.fetch(url, &token) {
                Ok(bytes) => match self.store.put(url, &bytes) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(url = %url, error = %e, "failed to store");
                        false
                    }
                },
                Err(e) => {
                    warn!(url = %url, error = %e, "failed to cache");
                    false
                }
            })
            .count();
        debug!(requested = urls.len(), stored, "cached pages");
        stored
    }

    fn precache_first_pages(&self, catalog_id: &str, count: usize) {
        let Some(metadata) = &self.metadata else {
            warn!("no metadata provider; cannot pre-cache pages");
            return;
        };
        match metadata.list_pages(catalog_id) {
            Ok(mut pages) => {
                pages.sort_by_key(|p| p.page_number);
                let urls: Vec<String> = pages
                    .into_iter()
                    .take(count)
                    .map(|p| p.image_url)
                    .filter(|u| !u.is_empty())
                    .collect();
                let stored = self.cache_urls(&urls);
                info!(catalog = %catalog_id, pages = urls.len(), stored, "pre-cached first pages");
            }
            Err(e) => warn!(catalog = %catalog_id, error = %e, "pre-cache pages failed"),
        }
    }

    /// Service loop; exits when every client handle is gone.
    pub(crate) fn run(self, commands: Receiver<Envelope>) {
        for Envelope { command, reply } in commands {
            let response = self.handle(command);
            if let (Some(tx), Some(response)) = (reply, response) {
                let _ = tx.send(response);
            }
        }
        debug!("persistent cache service stopped");
    }
}
