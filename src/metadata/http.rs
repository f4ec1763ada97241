//! HTTP metadata provider over the [`Fetcher`] stack.

use std::sync::Arc;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::types::{Hotspot, PageRecord, Product};
use super::{MetadataFetchError, MetadataProvider};
use crate::fetch::{CancelToken, FetchError, Fetcher};

/// Talks to the catalog backend rooted at `base_url`.
///
/// Endpoints:
/// - `GET {base}/api/flipbooks/{id}/pages`
/// - `GET {base}/hotspots?flipbookId=..&pageNumber=..`
/// - `GET {base}/products/search?query=..&page=1&limit=10&sortBy=name&sortOrder=asc`
///
/// Requests go through [`Fetcher::fetch_api`], so a persistent cache in
/// the fetcher stack keeps the last good response of each.
#[derive(Clone)]
pub struct HttpMetadataProvider {
    base: Url,
    fetcher: Arc<dyn Fetcher>,
}

impl HttpMetadataProvider {
    pub fn new(base_url: &str, fetcher: Arc<dyn Fetcher>) -> Result<Self, MetadataFetchError> {
        Ok(Self {
            base: parse_base(base_url)?,
            fetcher,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute form of a possibly relative asset URL.
    pub fn resolve(&self, url: &str) -> String {
        resolve_against(&self.base, url)
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, MetadataFetchError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| MetadataFetchError::BaseUrl(format!("{}: {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    fn get_json(&self, what: &'static str, url: Url) -> Result<Value, MetadataFetchError> {
        debug!(%url, what, "metadata request");
        let body = self
            .fetcher
            .fetch_api(url.as_str(), &CancelToken::new())
            .map_err(|e| {
                warn!(%url, error = %e, "metadata request failed");
                fetch_error(what, e)
            })?;
        serde_json::from_slice(&body).map_err(|e| MetadataFetchError::Decode {
            what,
            message: e.to_string(),
        })
    }
}

impl MetadataProvider for HttpMetadataProvider {
    fn list_pages(&self, catalog_id: &str) -> Result<Vec<PageRecord>, MetadataFetchError> {
        let url = self.endpoint(&format!("api/flipbooks/{}/pages", catalog_id), &[])?;
        let json = self.get_json("pages", url)?;
        let mut pages: Vec<PageRecord> = decode_list("pages", json)?;
        for page in &mut pages {
            page.image_url = self.resolve(&page.image_url);
        }
        pages.sort_by_key(|p| p.page_number);
        Ok(pages)
    }

    fn list_hotspots(
        &self,
        catalog_id: &str,
        page_number: u32,
    ) -> Result<Vec<Hotspot>, MetadataFetchError> {
        let url = self.endpoint(
            "hotspots",
            &[
                ("flipbookId", catalog_id.to_string()),
                ("pageNumber", page_number.to_string()),
            ],
        )?;
        let json = self.get_json("hotspots", url)?;
        let mut hotspots: Vec<Hotspot> = decode_list("hotspots", json)?;
        for hotspot in &mut hotspots {
            if hotspot.page_number == 0 {
                hotspot.page_number = page_number;
            }
        }
        Ok(hotspots)
    }

    fn search_products(&self, term: &str) -> Result<Vec<Product>, MetadataFetchError> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        let url = self.endpoint(
            "products/search",
            &[
                ("query", term.to_string()),
                ("page", "1".to_string()),
                ("limit", "10".to_string()),
                ("sortBy", "name".to_string()),
                ("sortOrder", "asc".to_string()),
            ],
        )?;
        let json = self.get_json("products", url)?;
        decode_list("products", json)
    }
}

/// Parse the API root, forcing a trailing slash so `join` appends.
pub(crate) fn parse_base(base_url: &str) -> Result<Url, MetadataFetchError> {
    let trimmed = base_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&with_slash)
        .map_err(|e| MetadataFetchError::BaseUrl(format!("{}: {}", base_url, e)))
}

fn fetch_error(what: &'static str, err: FetchError) -> MetadataFetchError {
    match err {
        FetchError::Http { status, reason } => MetadataFetchError::Status {
            what,
            status,
            reason,
        },
        other => MetadataFetchError::Transport {
            what,
            message: other.to_string(),
        },
    }
}

/// Absolute URLs pass through; anything else is joined onto `base`.
pub(crate) fn resolve_against(base: &Url, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    base.join(url)
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}

/// Accept `[..]`, `{"data": [..]}` or `{"items": [..]}`. Anything else is empty.
fn decode_list<T: DeserializeOwned>(
    what: &'static str,
    json: Value,
) -> Result<Vec<T>, MetadataFetchError> {
    let list = match json {
        Value::Array(_) => json,
        Value::Object(mut map) => match (map.remove("data"), map.remove("items")) {
            (Some(data @ Value::Array(_)), _) => data,
            (_, Some(items @ Value::Array(_))) => items,
            _ => Value::Array(Vec::new()),
        },
        _ => Value::Array(Vec::new()),
    };
    serde_json::from_value(list).map_err(|e| MetadataFetchError::Decode {
        what,
        message: e.to_string(),
    })
}
