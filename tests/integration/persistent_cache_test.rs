//! Persistent cache service, client and cache-first fetching together

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use flipcache::fetch::{CancelToken, Fetcher};
use flipcache::metadata::{HttpMetadataProvider, MetadataProvider, StaticMetadataProvider};
use flipcache::persistent::{
    CacheFirstFetcher, DiskAssetStore, PersistentCacheClient, PersistentCacheService,
};
use flipcache::preloader::PreloaderOptions;
use flipcache::{BackgroundPreloader, ImageMemoryCache};

use crate::helpers::{page_url, pages, MapFetcher};

const TIMEOUT: Duration = Duration::from_secs(10);

fn spawn_client(
    store: &Arc<DiskAssetStore>,
    network: &Arc<MapFetcher>,
    metadata: StaticMetadataProvider,
) -> PersistentCacheClient {
    let service = PersistentCacheService::new(Arc::clone(store), network.clone())
        .with_metadata(Arc::new(metadata));
    PersistentCacheClient::spawn(service)
}

#[test]
fn warm_then_serve_without_network() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(DiskAssetStore::open(dir.path(), "flipbook-v2").unwrap());
    let catalog = pages("fall", 5);
    let network = Arc::new(
        MapFetcher::new().with_pngs(catalog.iter().map(|p| &p.image_url)),
    );
    let metadata = StaticMetadataProvider::new().with_pages("fall", catalog.clone());

    let client = spawn_client(&store, &network, metadata);
    assert!(client.precache_first_pages("fall", 3));
    let status = client.status(TIMEOUT).unwrap();
    assert_eq!(status.get("flipbook-v2-flipbook"), Some(&3));
    client.shutdown();
    assert_eq!(network.request_count(), 3);

    // A later session reads the warmed pages from disk
    let cached = CacheFirstFetcher::new(Arc::clone(&network), Arc::clone(&store));
    let token = CancelToken::new();
    for n in 1..=3 {
        cached.fetch(&page_url("fall", n), &token).unwrap();
    }
    assert_eq!(network.request_count(), 3);

    // Page 4 goes to the network once and is written through
    cached.fetch(&page_url("fall", 4), &token).unwrap();
    cached.fetch(&page_url("fall", 4), &token).unwrap();
    assert_eq!(network.request_count(), 4);
    assert!(store.contains(&page_url("fall", 4)));
}

#[test]
fn preloader_decodes_bytes_from_disk_into_memory() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(DiskAssetStore::open(dir.path(), "flipbook-v2").unwrap());
    let catalog = pages("fall", 2);
    let urls: Vec<String> = catalog.iter().map(|p| p.image_url.clone()).collect();
    for url in &urls {
        store.put(url, &crate::helpers::png_bytes(8, 6)).unwrap();
    }

    // Nothing is served by the network
    let network = Arc::new(MapFetcher::new());
    let memory = Arc::new(ImageMemoryCache::default());
    let preloader = BackgroundPreloader::new(
        Arc::new(CacheFirstFetcher::new(Arc::clone(&network), store)),
        PreloaderOptions {
            cache: Some(memory.clone()),
            inline: true,
            ..Default::default()
        },
    );
    preloader.preload(urls.clone());

    assert_eq!(network.request_count(), 0);
    let image = memory.get(&urls[0]).unwrap();
    assert_eq!((image.width(), image.height()), (8, 6));
}

#[test]
fn clear_removes_every_cache() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(DiskAssetStore::open(dir.path(), "flipbook-v2").unwrap());
    let urls = vec![
        page_url("fall", 1),
        "https://api.test/api/flipbooks/fall/pages".to_string(),
    ];
    let network = Arc::new(
        MapFetcher::new()
            .with_pngs([&urls[0]])
            .with(&urls[1], b"[]".to_vec()),
    );

    let client = spawn_client(&store, &network, StaticMetadataProvider::new());
    assert!(client.cache_pages(urls.clone()));
    let status = client.status(TIMEOUT).unwrap();
    assert_eq!(status.get("flipbook-v2-flipbook"), Some(&1));
    assert_eq!(status.get("flipbook-v2-api"), Some(&1));

    assert!(client.clear());
    let status = client.status(TIMEOUT).unwrap();
    assert_eq!(status.values().sum::<usize>(), 0);
}

#[test]
fn new_version_purges_old_generation() {
    let dir = TempDir::new().unwrap();
    {
        let old = DiskAssetStore::open(dir.path(), "flipbook-v1").unwrap();
        old.put(&page_url("fall", 1), b"old").unwrap();
    }
    std::fs::create_dir(dir.path().join("unrelated")).unwrap();

    let store = DiskAssetStore::open(dir.path(), "flipbook-v2").unwrap();
    assert!(!dir.path().join("flipbook-v1-flipbook").exists());
    assert!(dir.path().join("unrelated").exists());
    assert!(!store.contains(&page_url("fall", 1)));
}

#[test]
fn absent_client_degrades_silently() {
    let client = PersistentCacheClient::absent();
    assert!(!client.is_available());
    assert!(!client.cache_pages(vec![page_url("fall", 1)]));
    assert!(!client.clear());
    assert_eq!(client.status(TIMEOUT), None);
}

#[test]
fn metadata_responses_are_kept_for_offline_use() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(DiskAssetStore::open(dir.path(), "flipbook-v2").unwrap());
    let pages_url = "http://backend.test/api/flipbooks/fall/pages";
    let hotspots_url = "http://backend.test/hotspots?flipbookId=fall&pageNumber=1";
    let online = Arc::new(
        MapFetcher::new()
            .with(
                pages_url,
                br#"[{"pageNumber":1,"imageUrl":"/uploads/p1.png"}]"#.to_vec(),
            )
            .with(
                hotspots_url,
                br#"[{"id":7,"x":1,"y":2,"width":3,"height":4}]"#.to_vec(),
            ),
    );
    let provider = HttpMetadataProvider::new(
        "http://backend.test",
        Arc::new(CacheFirstFetcher::new(Arc::clone(&online), Arc::clone(&store))),
    )
    .unwrap();
    assert_eq!(provider.list_pages("fall").unwrap().len(), 1);
    assert_eq!(provider.list_hotspots("fall", 1).unwrap().len(), 1);
    assert_eq!(store.status().unwrap().get("flipbook-v2-api"), Some(&2));

    // Every request now fails; the stored responses answer instead
    let offline = Arc::new(MapFetcher::new());
    let provider = HttpMetadataProvider::new(
        "http://backend.test",
        Arc::new(CacheFirstFetcher::new(Arc::clone(&offline), Arc::clone(&store))),
    )
    .unwrap();
    let pages = provider.list_pages("fall").unwrap();
    assert_eq!(pages[0].image_url, "http://backend.test/uploads/p1.png");
    assert_eq!(provider.list_hotspots("fall", 1).unwrap()[0].id, "7");
    assert_eq!(offline.request_count(), 2);
    assert!(provider.list_hotspots("fall", 2).is_err());
}
