//! Loading a catalog and browsing it with the viewer

use std::sync::{Arc, Mutex};

use flipcache::geometry::Size;
use flipcache::image_cache::CacheLimits;
use flipcache::loader::{
    CatalogLoader, EngineInitError, LoadError, LoaderOptions, LoaderState, LoaderStatus,
};
use flipcache::metadata::{HotspotTarget, StaticMetadataProvider};
use flipcache::preloader::{PreloaderOptions, PreloadResponse};
use flipcache::{BackgroundPreloader, ImageMemoryCache, ViewerController};

use crate::helpers::{hotspot, page_url, pages, MapFetcher};

fn catalog(count: u32) -> (Arc<StaticMetadataProvider>, Arc<MapFetcher>) {
    let pages = pages("spring", count);
    let urls: Vec<String> = pages.iter().map(|p| p.image_url.clone()).collect();

    let mut cta = hotspot("cta", 1, (10.0, 10.0, 30.0, 20.0));
    cta.link_url = Some("https://shop.test/sale".to_string());
    cta.z_index = 5;
    let mut product = hotspot("sku", 1, (50.0, 50.0, 80.0, 20.0));
    product.product_sku = Some("GC-42".to_string());
    let decorative = hotspot("deco", 1, (0.0, 0.0, 5.0, 5.0));

    let metadata = StaticMetadataProvider::new()
        .with_pages("spring", pages)
        .with_hotspots("spring", 1, vec![cta, product, decorative]);
    let fetcher = MapFetcher::new().with_pngs(&urls);
    (Arc::new(metadata), Arc::new(fetcher))
}

fn ok_engine() -> Arc<dyn flipcache::loader::EngineInitializer> {
    Arc::new(|_: &[flipcache::metadata::PageRecord]| Ok::<(), EngineInitError>(()))
}

#[test]
fn load_fills_memory_cache_and_reports_progress() {
    let (metadata, fetcher) = catalog(4);
    let cache = Arc::new(ImageMemoryCache::new(CacheLimits::default()));
    let preloader = Arc::new(BackgroundPreloader::new(
        fetcher.clone(),
        PreloaderOptions {
            cache: Some(cache.clone()),
            ..Default::default()
        },
    ));

    let states: Arc<Mutex<Vec<LoaderState>>> = Arc::default();
    let sink = states.clone();
    let mut loader = CatalogLoader::new(metadata, preloader, ok_engine());
    loader.subscribe(Arc::new(move |s: &LoaderState| sink.lock().unwrap().push(s.clone())));

    let loaded = loader.load("spring").unwrap();
    assert_eq!(loaded.pages.len(), 4);
    assert!(loaded.failed_images.is_empty());
    assert_eq!(loader.state().status, LoaderStatus::Ready);
    assert_eq!(loader.state().progress, 100.0);

    for n in 1..=4 {
        assert!(cache.has(&page_url("spring", n)));
    }

    let states = states.lock().unwrap();
    let progress: Vec<f64> = states.iter().map(|s| s.progress).collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{:?}", progress);
    assert_eq!(states.last().unwrap().status_text, "Ready!");
}

#[test]
fn missing_images_do_not_fail_the_load() {
    let (metadata, _) = catalog(3);
    // Only page 2 is served
    let fetcher = Arc::new(MapFetcher::new().with_pngs([&page_url("spring", 2)]));
    let preloader = Arc::new(BackgroundPreloader::new(fetcher, PreloaderOptions::default()));
    let mut loader = CatalogLoader::new(metadata, preloader, ok_engine());

    let loaded = loader.load("spring").unwrap();
    assert_eq!(loaded.failed_images.len(), 2);
    assert_eq!(loader.state().status, LoaderStatus::Ready);
}

#[test]
fn unknown_catalog_ends_in_error_state() {
    let (metadata, fetcher) = catalog(2);
    let preloader = Arc::new(BackgroundPreloader::new(fetcher, PreloaderOptions::default()));
    let mut loader = CatalogLoader::new(metadata, preloader, ok_engine());

    let err = loader.load("winter").unwrap_err();
    assert!(matches!(err, LoadError::Metadata(_)));
    assert_eq!(loader.state().status, LoaderStatus::Error);
    assert_eq!(loader.state().status_text, "Error loading catalog");
    assert!(loader.state().error_message.is_some());
}

#[test]
fn preload_count_limits_first_load() {
    let (metadata, fetcher) = catalog(6);
    let cache = Arc::new(ImageMemoryCache::default());
    let preloader = Arc::new(BackgroundPreloader::new(
        fetcher.clone(),
        PreloaderOptions {
            cache: Some(cache.clone()),
            ..Default::default()
        },
    ));
    let mut loader = CatalogLoader::new(metadata, preloader, ok_engine()).with_options(
        LoaderOptions {
            preload_count: Some(2),
            ..Default::default()
        },
    );

    loader.load("spring").unwrap();
    assert_eq!(fetcher.request_count(), 2);
    assert_eq!(cache.len(), 2);
}

#[test]
fn viewer_preloads_lookahead_and_projects_hotspots() {
    let (metadata, fetcher) = catalog(5);
    let cache = Arc::new(ImageMemoryCache::default());
    let preloader = Arc::new(BackgroundPreloader::new(
        fetcher.clone(),
        PreloaderOptions {
            cache: Some(cache.clone()),
            inline: true,
            ..Default::default()
        },
    ));

    let mut viewer = ViewerController::new(
        "spring",
        pages("spring", 5),
        cache.clone(),
        preloader.clone(),
        metadata,
    );

    // Page 1: current plus two ahead
    viewer.preload_around();
    assert_eq!(cache.len(), 3);
    assert!(viewer.current_image().is_some());

    assert!(viewer.next());
    assert!(viewer.next());
    // Page 3 reaches page 5; page 2 is already cached
    assert_eq!(cache.len(), 5);
    assert_eq!(fetcher.request_count(), 5);

    viewer.go_to(0);
    let projected = viewer.project_current(Size::new(400.0, 600.0)).unwrap();
    assert_eq!(projected.len(), 2);
    // Lowest z-index first
    assert_eq!(projected[0].id, "sku");
    assert_eq!(
        projected[0].target,
        HotspotTarget::Product {
            sku: "GC-42".to_string()
        }
    );
    assert_eq!(projected[1].id, "cta");
    assert!(projected[1]
        .rect
        .approx_eq(&flipcache::PixelRect::new(40.0, 60.0, 120.0, 120.0), 1e-9));
    // The wide hotspot keeps its clamped width past the right edge
    assert_eq!(projected[0].rect.width, 320.0);

    let events = preloader.drain();
    assert!(events
        .iter()
        .all(|e| !matches!(e, PreloadResponse::Error { .. })));
}
