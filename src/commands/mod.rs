//! Command handlers for the flipcache CLI.
//!
//! Each submodule handles a specific CLI command or command group.
//! The main dispatch logic remains in main.rs.

pub mod cache;
pub mod config;
pub mod hotspots;
pub mod load;
pub mod products;
pub mod project;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

use flipcache::fetch::{Fetcher, HttpFetcher};
use flipcache::metadata::HttpMetadataProvider;
use flipcache::persistent::{
    CacheFirstFetcher, DiskAssetStore, PersistentCacheClient, PersistentCacheService,
};
use flipcache::Config;

/// Network and cache collaborators built from the configuration.
pub struct Backend {
    pub config: Config,
    /// Direct network access
    pub network: HttpFetcher,
    /// Network access through the persistent cache when it is available
    pub fetcher: Arc<dyn Fetcher>,
    pub store: Option<Arc<DiskAssetStore>>,
    pub metadata: Arc<HttpMetadataProvider>,
}

impl Backend {
    pub fn connect(config: Config) -> Result<Self> {
        let network =
            HttpFetcher::new(config.auth_header()).context("Failed to create HTTP client")?;
        let store = open_store(&config);
        let fetcher: Arc<dyn Fetcher> = match &store {
            Some(store) => Arc::new(CacheFirstFetcher::new(network.clone(), Arc::clone(store))),
            None => Arc::new(network.clone()),
        };
        let metadata = Arc::new(
            HttpMetadataProvider::new(&config.api.base_url, Arc::clone(&fetcher))
                .context("Invalid [api].base_url")?,
        );

        Ok(Self {
            config,
            network,
            fetcher,
            store,
            metadata,
        })
    }

    /// Client for the persistent cache service; absent without a store.
    pub fn persistent_client(&self) -> PersistentCacheClient {
        match &self.store {
            Some(store) => {
                let service =
                    PersistentCacheService::new(Arc::clone(store), Arc::new(self.network.clone()))
                        .with_metadata(self.metadata.clone());
                PersistentCacheClient::spawn(service)
            }
            None => PersistentCacheClient::absent(),
        }
    }
}

/// Open the on-disk store. Any failure silently disables it.
fn open_store(config: &Config) -> Option<Arc<DiskAssetStore>> {
    if !config.persistent_cache.enabled {
        return None;
    }
    let dir = config.cache_directory();
    match DiskAssetStore::open(&dir, &config.persistent_cache.version) {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "persistent cache unavailable");
            None
        }
    }
}
