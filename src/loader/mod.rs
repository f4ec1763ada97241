//! Catalog loading sequence
//!
//! [`CatalogLoader`] drives a [`LoadingStateMachine`] through one load:
//! fetch the page list, preload the page images on the
//! [`BackgroundPreloader`], hand the pages to the viewer engine, done.
//! The state machine itself does no I/O; this module performs the calls and
//! interprets their results into transitions.

pub mod state;

pub use state::{LoaderState, LoaderStatus, LoadingStateMachine, StateObserver, TransitionError};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::metadata::{MetadataFetchError, MetadataProvider, PageRecord};
use crate::preloader::{BackgroundPreloader, PreloadResponse, Priority};

/// The viewer engine refused to start.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct EngineInitError(pub String);

/// Prepares the rendering engine once pages are available.
pub trait EngineInitializer: Send + Sync {
    fn initialize(&self, pages: &[PageRecord]) -> Result<(), EngineInitError>;
}

impl<F> EngineInitializer for F
where
    F: Fn(&[PageRecord]) -> Result<(), EngineInitError> + Send + Sync,
{
    fn initialize(&self, pages: &[PageRecord]) -> Result<(), EngineInitError> {
        self(pages)
    }
}

/// Why a load ended in `ERROR`.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Metadata(#[from] MetadataFetchError),

    #[error("Catalog has no pages")]
    NoPages,

    #[error("Loading cancelled")]
    Cancelled,

    #[error("Failed to initialize viewer: {0}")]
    Engine(#[from] EngineInitError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("no catalog has been loaded yet")]
    NothingToRetry,
}

/// Tuning for [`CatalogLoader`].
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Pages preloaded before the engine starts; `None` preloads all
    pub preload_count: Option<usize>,
    /// Simultaneous image fetches
    pub concurrency: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            preload_count: None,
            concurrency: crate::preloader::DEFAULT_CONCURRENCY,
        }
    }
}

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub catalog_id: String,
    pub pages: Vec<PageRecord>,
    /// Images that failed to preload; the catalog is usable regardless
    pub failed_images: Vec<String>,
}

/// Runs the catalog loading sequence.
pub struct CatalogLoader {
    metadata: Arc<dyn MetadataProvider>,
    preloader: Arc<BackgroundPreloader>,
    engine: Arc<dyn EngineInitializer>,
    options: LoaderOptions,
    observers: Vec<StateObserver>,
    machine: LoadingStateMachine,
    last_catalog: Option<String>,
    /// Set by [`LoadCanceller`]; cleared when a load starts
    cancelled: Arc<AtomicBool>,
}

impl CatalogLoader {
    pub fn new(
        metadata: Arc<dyn MetadataProvider>,
        preloader: Arc<BackgroundPreloader>,
        engine: Arc<dyn EngineInitializer>,
    ) -> Self {
        Self {
            metadata,
            preloader,
            engine,
            options: LoaderOptions::default(),
            observers: Vec::new(),
            machine: LoadingStateMachine::new(),
            last_catalog: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    /// Observe every state change of this and all later loads.
    pub fn subscribe(&mut self, observer: StateObserver) {
        self.machine.subscribe(Arc::clone(&observer));
        self.observers.push(observer);
    }

    pub fn state(&self) -> &LoaderState {
        self.machine.state()
    }

    pub fn preloader(&self) -> &Arc<BackgroundPreloader> {
        &self.preloader
    }

    /// Load `catalog_id` from a fresh `IDLE` state.
    pub fn load(&mut self, catalog_id: &str) -> Result<LoadedCatalog, LoadError> {
        self.reset();
        self.last_catalog = Some(catalog_id.to_string());
        info!(catalog = %catalog_id, "loading catalog");

        match self.run(catalog_id) {
            Ok(loaded) => Ok(loaded),
            Err(e) => {
                if self.machine.status() != LoaderStatus::Error {
                    let _ = self.machine.fail(e.to_string());
                }
                Err(e)
            }
        }
    }

    /// Restart the last load with a fresh state machine.
    pub fn retry(&mut self) -> Result<LoadedCatalog, LoadError> {
        let catalog_id = self.last_catalog.clone().ok_or(LoadError::NothingToRetry)?;
        debug!(catalog = %catalog_id, "retrying catalog load");
        self.load(&catalog_id)
    }

    fn reset(&mut self) {
        self.cancelled.store(false, Ordering::SeqCst);
        let mut machine = LoadingStateMachine::new();
        for observer in &self.observers {
            machine.subscribe(Arc::clone(observer));
        }
        self.machine = machine;
    }

    fn run(&mut self, catalog_id: &str) -> Result<LoadedCatalog, LoadError> {
        self.machine.begin()?;

        let pages = self.metadata.list_pages(catalog_id)?;
        self.check_cancelled()?;
        if pages.is_empty() {
            return Err(LoadError::NoPages);
        }
        self.machine.data_ready()?;

        let take = self.options.preload_count.unwrap_or(pages.len());
        let urls: Vec<String> = pages
            .iter()
            .take(take)
            .map(|p| p.image_url.clone())
            .collect();
        let failed_images = self.preload(urls)?;
        // A cancel racing with submit may leave the job running to completion
        self.check_cancelled()?;
        self.machine.images_ready()?;

        self.engine.initialize(&pages)?;
        self.machine.engine_ready()?;

        info!(
            catalog = %catalog_id,
            pages = pages.len(),
            failed = failed_images.len(),
            "catalog ready"
        );
        Ok(LoadedCatalog {
            catalog_id: catalog_id.to_string(),
            pages,
            failed_images,
        })
    }

    /// Preload `urls` and feed progress into the machine. Returns failed URLs.
    fn preload(&mut self, urls: Vec<String>) -> Result<Vec<String>, LoadError> {
        self.check_cancelled()?;
        let job = self
            .preloader
            .submit(urls, self.options.concurrency, Priority::High);
        let mut failed = Vec::new();

        loop {
            let msg = self.preloader.recv().map_err(|_| LoadError::Cancelled)?;
            if msg.job() != job {
                continue;
            }
            match msg {
                PreloadResponse::Progress { loaded, total, .. } => {
                    self.machine.update_progress(loaded, total)?;
                }
                PreloadResponse::Error { url, error, .. } => {
                    warn!(url = %url, %error, "page image failed to preload");
                    failed.push(url);
                }
                PreloadResponse::Loaded { .. } => {}
                PreloadResponse::Completed { .. } => return Ok(failed),
                PreloadResponse::Cancelled { .. } => return Err(LoadError::Cancelled),
            }
        }
    }

    fn check_cancelled(&self) -> Result<(), LoadError> {
        if self.cancelled.load(Ordering::SeqCst) {
            Err(LoadError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Abort an in-progress load from another thread.
    pub fn cancel_handle(&self) -> LoadCanceller {
        LoadCanceller {
            cancelled: Arc::clone(&self.cancelled),
            preloader: Arc::clone(&self.preloader),
        }
    }
}

/// Cancels the current load of a [`CatalogLoader`]; `Send + Sync`.
///
/// The cancel sticks until the next `load` or `retry`, so it takes effect
/// at the next phase boundary even when no images are being fetched yet.
#[derive(Clone)]
pub struct LoadCanceller {
    cancelled: Arc<AtomicBool>,
    preloader: Arc<BackgroundPreloader>,
}

impl LoadCanceller {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.preloader.cancel();
    }
}
