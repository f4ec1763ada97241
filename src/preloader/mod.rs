//! Background image preloader
//!
//! Fetches batches of page images off the caller's thread, reports
//! per-URL outcomes and progress over a channel, and optionally decodes the
//! results into a shared [`ImageMemoryCache`].
//!
//! # Protocol
//!
//! - [`PreloadRequest::Preload`] queues a job and returns its [`JobId`]
//! - [`PreloadRequest::Cancel`] aborts every job submitted so far
//! - [`PreloadResponse`] events are read with [`BackgroundPreloader::recv`]
//!
//! Within a job, chunk *k* fully settles before chunk *k+1* starts; within a
//! chunk completion order is first-finished-first-reported.

mod progress;
pub mod protocol;
mod worker;

pub use protocol::{JobId, PreloadRequest, PreloadResponse, Priority};
pub use worker::{JobQueue, PreloadJob};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::fetch::{CancelToken, Fetcher};
use crate::image_cache::ImageMemoryCache;
use progress::Emitter;
use worker::{InFlight, WorkerContext};

/// Default number of simultaneous fetches per chunk.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Options for [`BackgroundPreloader::new`].
#[derive(Clone, Default)]
pub struct PreloaderOptions {
    /// Default chunk size; `None` uses [`DEFAULT_CONCURRENCY`]
    pub concurrency: Option<usize>,
    /// Cache to decode fetched images into
    pub cache: Option<Arc<ImageMemoryCache>>,
    /// Run jobs on the submitting thread instead of a background thread
    pub inline: bool,
}

enum Execution {
    Background {
        jobs: Option<Sender<PreloadJob>>,
        handle: Option<JoinHandle<()>>,
    },
    /// No background thread available; jobs run inside `post`
    Inline,
}

/// Handle to a background preloading worker.
///
/// Dropping the handle cancels outstanding work and joins the thread.
pub struct BackgroundPreloader {
    context: Arc<WorkerContext>,
    execution: Execution,
    responses: Mutex<Receiver<PreloadResponse>>,
    generation: Mutex<CancelToken>,
    next_job: AtomicU64,
    concurrency: usize,
}

impl BackgroundPreloader {
    pub fn new(fetcher: Arc<dyn Fetcher>, options: PreloaderOptions) -> Self {
        let (response_tx, responses) = channel();
        let context = Arc::new(WorkerContext {
            fetcher,
            cache: options.cache,
            in_flight: InFlight::default(),
            emitter: Emitter::new(response_tx),
        });

        let execution = if options.inline {
            Execution::Inline
        } else {
            spawn_worker(Arc::clone(&context))
        };

        Self {
            context,
            execution,
            responses: Mutex::new(responses),
            generation: Mutex::new(CancelToken::new()),
            next_job: AtomicU64::new(1),
            concurrency: options.concurrency.unwrap_or(DEFAULT_CONCURRENCY).max(1),
        }
    }

    /// Whether jobs run on a dedicated background thread.
    pub fn is_background(&self) -> bool {
        matches!(self.execution, Execution::Background { .. })
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn current_token(&self) -> MutexGuard<'_, CancelToken> {
        self.generation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Handle one protocol request. Returns the job id for `Preload`.
    pub fn post(&self, request: PreloadRequest) -> Option<JobId> {
        match request {
            PreloadRequest::Preload {
                urls,
                priority,
                concurrency,
            } => Some(self.submit(urls, concurrency.unwrap_or(self.concurrency), priority)),
            PreloadRequest::Cancel => {
                self.cancel();
                None
            }
        }
    }

    /// Queue `urls` at normal priority with the default concurrency.
    pub fn preload(&self, urls: Vec<String>) -> JobId {
        self.submit(urls, self.concurrency, Priority::Normal)
    }

    /// Queue `urls`, fetching at most `concurrency` at a time.
    pub fn submit(&self, urls: Vec<String>, concurrency: usize, priority: Priority) -> JobId {
        let id = JobId(self.next_job.fetch_add(1, Ordering::SeqCst));
        let job = PreloadJob {
            id,
            urls,
            concurrency: concurrency.max(1),
            priority,
            token: self.current_token().clone(),
        };
        debug!(job = id.0, urls = job.urls.len(), "preload queued");

        match &self.execution {
            Execution::Background { jobs: Some(tx), .. } => {
                if let Err(e) = tx.send(job) {
                    warn!("preload worker gone, running job inline");
                    self.context.execute(e.0);
                }
            }
            _ => self.context.execute(job),
        }
        id
    }

    /// Abort every job submitted so far.
    ///
    /// In-flight fetches stop without reporting, already cached images
    /// stay cached, and later submissions start from a clean slate.
    pub fn cancel(&self) {
        let _gate = self.context.emitter.hold();
        let mut token = self.current_token();
        token.cancel();
        *token = CancelToken::new();
        self.context.in_flight.clear();
        debug!("preload cancelled");
    }

    fn receiver(&self) -> MutexGuard<'_, Receiver<PreloadResponse>> {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn try_recv(&self) -> Result<PreloadResponse, TryRecvError> {
        self.receiver().try_recv()
    }

    pub fn recv(&self) -> Result<PreloadResponse, RecvError> {
        self.receiver().recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<PreloadResponse, RecvTimeoutError> {
        self.receiver().recv_timeout(timeout)
    }

    /// Every event received so far, without blocking.
    pub fn drain(&self) -> Vec<PreloadResponse> {
        self.receiver().try_iter().collect()
    }
}

fn spawn_worker(context: Arc<WorkerContext>) -> Execution {
    let (jobs_tx, jobs_rx) = channel();
    match thread::Builder::new()
        .name("flipbook-preloader".to_string())
        .spawn(move || context.run(jobs_rx))
    {
        Ok(handle) => Execution::Background {
            jobs: Some(jobs_tx),
            handle: Some(handle),
        },
        Err(e) => {
            warn!(error = %e, "could not spawn preload thread, running inline");
            Execution::Inline
        }
    }
}

impl Drop for BackgroundPreloader {
    fn drop(&mut self) {
        self.cancel();
        if let Execution::Background { jobs, handle } = &mut self.execution {
            // Closing the channel lets the worker loop exit
            drop(jobs.take());
            if let Some(handle) = handle.take() {
                let _ = handle.join();
            }
        }
    }
}
