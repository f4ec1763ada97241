//! Page navigation, lookahead preloading and hotspot projection for one
//! open catalog.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace};

use crate::geometry::{percent_to_pixels, PixelRect, Size};
use crate::image_cache::{ImageHandle, ImageMemoryCache};
use crate::metadata::{Hotspot, HotspotTarget, MetadataFetchError, MetadataProvider, PageRecord};
use crate::preloader::{BackgroundPreloader, JobId, Priority};

/// Lookahead and visibility settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerOptions {
    /// Pages after the current one to keep warm
    pub preload_ahead: usize,
    /// Pages before the current one to keep warm
    pub preload_behind: usize,
    /// Pages either side of the current one that count as visible
    pub visible_buffer: usize,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            preload_ahead: 2,
            preload_behind: 1,
            visible_buffer: 1,
        }
    }
}

/// A hotspot placed in the current image's pixel box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedHotspot {
    pub id: String,
    pub rect: PixelRect,
    pub z_index: i32,
    pub target: HotspotTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Page navigation and per-page hotspot projection over a loaded catalog.
///
/// Navigation triggers lookahead preloading of nearby pages that are not in
/// the memory cache yet. The controller drains the preloader's events, so
/// it should own its preloader or share it only with sequential users.
pub struct ViewerController {
    catalog_id: String,
    pages: Vec<PageRecord>,
    current: usize,
    cache: Arc<ImageMemoryCache>,
    preloader: Arc<BackgroundPreloader>,
    metadata: Arc<dyn MetadataProvider>,
    hotspots: HashMap<u32, Vec<Hotspot>>,
    options: ViewerOptions,
}

impl ViewerController {
    pub fn new(
        catalog_id: impl Into<String>,
        mut pages: Vec<PageRecord>,
        cache: Arc<ImageMemoryCache>,
        preloader: Arc<BackgroundPreloader>,
        metadata: Arc<dyn MetadataProvider>,
    ) -> Self {
        pages.sort_by_key(|p| p.page_number);
        Self {
            catalog_id: catalog_id.into(),
            pages,
            current: 0,
            cache,
            preloader,
            metadata,
            hotspots: HashMap::new(),
            options: ViewerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ViewerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Zero-based index of the current page.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_page(&self) -> Option<&PageRecord> {
        self.pages.get(self.current)
    }

    /// Decoded image of the current page, if cached. Refreshes its LRU slot.
    pub fn current_image(&self) -> Option<ImageHandle> {
        self.current_page()
            .and_then(|page| self.cache.get(&page.image_url))
    }

    /// Advance one page. Returns false at the last page.
    pub fn next(&mut self) -> bool {
        if self.current + 1 >= self.pages.len() {
            return false;
        }
        self.go_to(self.current + 1);
        true
    }

    /// Go back one page. Returns false at the first page.
    pub fn previous(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.go_to(self.current - 1);
        true
    }

    /// Jump to `index`, clamped to the page range. Returns the new index.
    pub fn go_to(&mut self, index: usize) -> usize {
        let last = self.pages.len().saturating_sub(1);
        self.current = index.min(last);
        debug!(catalog = %self.catalog_id, page = self.current + 1, "page changed");
        self.preload_around();
        self.current
    }

    /// Pages within `visible_buffer` of the current one, in order.
    pub fn visible_pages(&self) -> &[PageRecord] {
        if self.pages.is_empty() {
            return &[];
        }
        let start = self.current.saturating_sub(self.options.visible_buffer);
        let end = (self.current + self.options.visible_buffer + 1).min(self.pages.len());
        &self.pages[start..end]
    }

    /// Image URLs in the lookahead window that the memory cache lacks.
    pub fn lookahead_urls(&self) -> Vec<String> {
        if self.pages.is_empty() {
            return Vec::new();
        }
        let start = self.current.saturating_sub(self.options.preload_behind);
        let end = (self.current + self.options.preload_ahead + 1).min(self.pages.len());

        // Current page first, then ahead, then behind
        let ahead = self.current..end;
        let behind = (start..self.current).rev();
        ahead
            .chain(behind)
            .map(|i| &self.pages[i].image_url)
            .filter(|url| !self.cache.has(url))
            .cloned()
            .collect()
    }

    /// Queue the lookahead window. `None` when everything is cached.
    pub fn preload_around(&mut self) -> Option<JobId> {
        let stale = self.preloader.drain();
        if !stale.is_empty() {
            trace!(events = stale.len(), "discarded preloader events");
        }
        let urls = self.lookahead_urls();
        if urls.is_empty() {
            return None;
        }
        Some(
            self.preloader
                .submit(urls, self.preloader.concurrency(), Priority::Normal),
        )
    }

    /// Hotspots of `page_number`, fetched once per page.
    pub fn hotspots(&mut self, page_number: u32) -> Result<&[Hotspot], MetadataFetchError> {
        if !self.hotspots.contains_key(&page_number) {
            let fetched = self.metadata.list_hotspots(&self.catalog_id, page_number)?;
            debug!(page = page_number, count = fetched.len(), "hotspots loaded");
            self.hotspots.insert(page_number, fetched);
        }
        Ok(self
            .hotspots
            .get(&page_number)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    /// Interactive hotspots of `page_number` in pixels of `container`,
    /// lowest z-index first.
    pub fn project_hotspots(
        &mut self,
        page_number: u32,
        container: Size,
    ) -> Result<Vec<ProjectedHotspot>, MetadataFetchError> {
        Ok(project(self.hotspots(page_number)?, container))
    }

    /// [`Self::project_hotspots`] for the current page.
    pub fn project_current(
        &mut self,
        container: Size,
    ) -> Result<Vec<ProjectedHotspot>, MetadataFetchError> {
        match self.current_page().map(|p| p.page_number) {
            Some(page_number) => self.project_hotspots(page_number, container),
            None => Ok(Vec::new()),
        }
    }
}

/// Project hotspots into `container`, skipping non-interactive ones.
pub fn project(hotspots: &[Hotspot], container: Size) -> Vec<ProjectedHotspot> {
    let mut projected: Vec<ProjectedHotspot> = hotspots
        .iter()
        .filter_map(|h| {
            let target = h.target()?;
            Some(ProjectedHotspot {
                id: h.id.clone(),
                rect: percent_to_pixels(&h.percent_rect(), container),
                z_index: h.z_index,
                target,
                label: h.label.clone(),
            })
        })
        .collect();
    projected.sort_by_key(|p| p.z_index);
    projected
}
