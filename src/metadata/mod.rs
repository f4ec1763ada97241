//! Catalog metadata provider
//!
//! Page lists, hotspots and product search come from the catalog backend.
//! The [`MetadataProvider`] trait is the seam; [`HttpMetadataProvider`]
//! talks to the real backend and [`StaticMetadataProvider`] serves fixed
//! data (offline use and tests).

pub mod http;
pub mod types;

pub use http::HttpMetadataProvider;
pub use types::{Hotspot, HotspotTarget, PageRecord, Product};

use std::collections::HashMap;

use thiserror::Error;

/// Page or hotspot data could not be obtained.
#[derive(Debug, Error)]
pub enum MetadataFetchError {
    #[error("Failed to load {what}: {status} {reason}")]
    Status {
        what: &'static str,
        status: u16,
        reason: String,
    },

    #[error("Failed to load {what}: {message}")]
    Transport { what: &'static str, message: String },

    #[error("Invalid {what} response: {message}")]
    Decode { what: &'static str, message: String },

    #[error("Invalid API base URL '{0}'")]
    BaseUrl(String),
}

/// Source of catalog metadata.
pub trait MetadataProvider: Send + Sync {
    /// Pages of a catalog, ordered by page number.
    fn list_pages(&self, catalog_id: &str) -> Result<Vec<PageRecord>, MetadataFetchError>;

    fn list_hotspots(
        &self,
        catalog_id: &str,
        page_number: u32,
    ) -> Result<Vec<Hotspot>, MetadataFetchError>;

    /// Products matching `term`. A blank term yields no results.
    fn search_products(&self, term: &str) -> Result<Vec<Product>, MetadataFetchError>;
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for std::sync::Arc<P> {
    fn list_pages(&self, catalog_id: &str) -> Result<Vec<PageRecord>, MetadataFetchError> {
        (**self).list_pages(catalog_id)
    }

    fn list_hotspots(
        &self,
        catalog_id: &str,
        page_number: u32,
    ) -> Result<Vec<Hotspot>, MetadataFetchError> {
        (**self).list_hotspots(catalog_id, page_number)
    }

    fn search_products(&self, term: &str) -> Result<Vec<Product>, MetadataFetchError> {
        (**self).search_products(term)
    }
}

/// In-memory provider.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadataProvider {
    pages: HashMap<String, Vec<PageRecord>>,
    hotspots: HashMap<(String, u32), Vec<Hotspot>>,
    products: Vec<Product>,
}

impl StaticMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(mut self, catalog_id: &str, pages: Vec<PageRecord>) -> Self {
        self.pages.insert(catalog_id.to_string(), pages);
        self
    }

    pub fn with_hotspots(
        mut self,
        catalog_id: &str,
        page_number: u32,
        hotspots: Vec<Hotspot>,
    ) -> Self {
        self.hotspots
            .insert((catalog_id.to_string(), page_number), hotspots);
        self
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }
}

impl MetadataProvider for StaticMetadataProvider {
    fn list_pages(&self, catalog_id: &str) -> Result<Vec<PageRecord>, MetadataFetchError> {
        let mut pages = self.pages.get(catalog_id).cloned().ok_or_else(|| {
            MetadataFetchError::Status {
                what: "pages",
                status: 404,
                reason: "Not Found".to_string(),
            }
        })?;
        pages.sort_by_key(|p| p.page_number);
        Ok(pages)
    }

    fn list_hotspots(
        &self,
        catalog_id: &str,
        page_number: u32,
    ) -> Result<Vec<Hotspot>, MetadataFetchError> {
        Ok(self
            .hotspots
            .get(&(catalog_id.to_string(), page_number))
            .cloned()
            .unwrap_or_default())
    }

    fn search_products(&self, term: &str) -> Result<Vec<Product>, MetadataFetchError> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .products
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&term)
                    || p.sku
                        .as_deref()
                        .is_some_and(|sku| sku.to_lowercase().contains(&term))
            })
            .cloned()
            .collect())
    }
}
