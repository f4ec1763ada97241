//! Load command handler

use anyhow::{bail, Result};
use std::io::Write;
use std::sync::Arc;

use flipcache::image_cache::ImageMemoryCache;
use flipcache::loader::{
    CatalogLoader, EngineInitError, LoaderOptions, LoaderState, LoaderStatus,
};
use flipcache::metadata::PageRecord;
use flipcache::preloader::{BackgroundPreloader, PreloaderOptions};
use flipcache::Config;

use super::Backend;

/// Run the catalog loading sequence and report progress on stderr.
#[cfg(not(tarpaulin_include))]
pub fn handle(
    catalog: &str,
    preload_count: Option<usize>,
    concurrency: Option<usize>,
    json: bool,
) -> Result<()> {
    let config = Config::load()?;
    let backend = Backend::connect(config)?;
    let concurrency = concurrency.unwrap_or(backend.config.preload.concurrency).max(1);

    let cache = Arc::new(ImageMemoryCache::new(backend.config.cache_limits()));
    let preloader = Arc::new(BackgroundPreloader::new(
        Arc::clone(&backend.fetcher),
        PreloaderOptions {
            concurrency: Some(concurrency),
            cache: Some(Arc::clone(&cache)),
            inline: false,
        },
    ));
    let engine = Arc::new(|pages: &[PageRecord]| -> Result<(), EngineInitError> {
        tracing::debug!(pages = pages.len(), "engine initialized");
        Ok(())
    });

    let mut loader = CatalogLoader::new(backend.metadata.clone(), preloader, engine).with_options(
        LoaderOptions {
            preload_count,
            concurrency,
        },
    );
    if !json {
        loader.subscribe(Arc::new(print_progress));
    }

    let canceller = loader.cancel_handle();
    ctrlc::set_handler(move || canceller.cancel()).ok(); // Ignore if handler already set

    let result = loader.load(catalog);
    if !json {
        eprintln!();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(loader.state())?);
    }

    match result {
        Ok(loaded) => {
            if !json {
                let stats = cache.stats();
                println!("Catalog:  {}", loaded.catalog_id);
                println!("Pages:    {}", loaded.pages.len());
                println!(
                    "Cached:   {} images ({} of {})",
                    stats.entries,
                    humansize::format_size(stats.size_bytes, humansize::BINARY),
                    humansize::format_size(stats.max_bytes, humansize::BINARY)
                );
                if !loaded.failed_images.is_empty() {
                    println!("Failed:   {}", loaded.failed_images.len());
                    for url in &loaded.failed_images {
                        println!("  {}", url);
                    }
                }
            }
            Ok(())
        }
        Err(e) => bail!("{}", e),
    }
}

fn print_progress(state: &LoaderState) {
    let mut stderr = std::io::stderr();
    let _ = write!(stderr, "\r[{:>3.0}%] {:<28}", state.progress, state.status_text);
    if state.status == LoaderStatus::Error {
        if let Some(message) = &state.error_message {
            let _ = write!(stderr, " {}", message);
        }
    }
    let _ = stderr.flush();
}
