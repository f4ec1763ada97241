//! Background execution of preload jobs
//!
//! A single named thread drains the job channel into a priority queue and
//! runs one job at a time. Each job is split into chunks of `concurrency`
//! URLs; a chunk runs on a dedicated Rayon pool of the same size and must
//! fully settle before the next chunk starts. This bounds peak concurrency
//! and memory while still reporting progress per URL.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::progress::{Emitter, JobProgress};
use super::protocol::{JobId, PreloadResponse, Priority};
use crate::fetch::{CancelToken, Fetcher};
use crate::image_cache::{ImageHandle, ImageMemoryCache};

/// A preload job waiting to run.
#[derive(Debug, Clone)]
pub struct PreloadJob {
    pub id: JobId,
    pub urls: Vec<String>,
    pub concurrency: usize,
    pub priority: Priority,
    pub(crate) token: CancelToken,
}

impl PartialEq for PreloadJob {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PreloadJob {}

impl PartialOrd for PreloadJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PreloadJob {
    /// Higher priority first, then lower (older) job id first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Pending jobs ordered by priority, FIFO within a priority.
#[derive(Debug, Default)]
pub struct JobQueue {
    heap: BinaryHeap<PreloadJob>,
}

impl JobQueue {
    pub fn push(&mut self, job: PreloadJob) {
        self.heap.push(job);
    }

    pub fn pop(&mut self) -> Option<PreloadJob> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// URLs currently being fetched, tagged with the job that owns them.
#[derive(Default)]
pub(crate) struct InFlight {
    urls: Mutex<HashMap<String, JobId>>,
}

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, JobId>> {
        self.urls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim `url` for `job`; `None` if someone is already fetching it.
    fn claim<'a>(&'a self, url: &str, job: JobId) -> Option<InFlightGuard<'a>> {
        let mut urls = self.lock();
        if urls.contains_key(url) {
            return None;
        }
        urls.insert(url.to_string(), job);
        Some(InFlightGuard {
            set: self,
            url: url.to_string(),
            job,
        })
    }

    /// Forget every claim. Stale guards will not remove newer claims.
    pub(crate) fn clear(&self) {
        self.lock().clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}

struct InFlightGuard<'a> {
    set: &'a InFlight,
    url: String,
    job: JobId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut urls = self.set.lock();
        if urls.get(&self.url) == Some(&self.job) {
            urls.remove(&self.url);
        }
    }
}

/// State shared by the worker thread and the controlling handle.
pub(crate) struct WorkerContext {
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) cache: Option<Arc<ImageMemoryCache>>,
    pub(crate) in_flight: InFlight,
    pub(crate) emitter: Emitter,
}

impl WorkerContext {
    /// Worker thread body. Returns when the job channel closes.
    pub(crate) fn run(self: Arc<Self>, jobs: Receiver<PreloadJob>) {
        let mut queue = JobQueue::default();
        loop {
            if queue.is_empty() {
                match jobs.recv() {
                    Ok(job) => queue.push(job),
                    Err(_) => return,
                }
            }
            while let Ok(job) = jobs.try_recv() {
                queue.push(job);
            }
            if let Some(job) = queue.pop() {
                self.execute(job);
            }
        }
    }

    /// Run one job to completion or cancellation.
    pub(crate) fn execute(&self, job: PreloadJob) {
        let progress = JobProgress::new(
            job.id,
            job.urls.len(),
            job.token.clone(),
            self.emitter.clone(),
        );

        if job.token.is_cancelled() {
            debug!(job = job.id.0, "job cancelled before start");
            progress.finish();
            return;
        }

        let concurrency = job.concurrency.max(1);
        info!(
            job = job.id.0,
            urls = job.urls.len(),
            concurrency,
            priority = ?job.priority,
            "preload started"
        );

        match rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .thread_name(|i| format!("preload-{}", i))
            .build()
        {
            Ok(pool) => {
                for chunk in job.urls.chunks(concurrency) {
                    if job.token.is_cancelled() {
                        break;
                    }
                    pool.install(|| {
                        chunk
                            .par_iter()
                            .for_each(|url| self.fetch_one(url, &progress))
                    });
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to build preload pool, fetching sequentially");
                for url in &job.urls {
                    if job.token.is_cancelled() {
                        break;
                    }
                    self.fetch_one(url, &progress);
                }
            }
        }

        let (loaded, total) = progress.get_progress();
        info!(
            job = job.id.0,
            loaded,
            total,
            cancelled = job.token.is_cancelled(),
            "preload finished"
        );
        progress.finish();
    }

    fn fetch_one(&self, url: &str, progress: &JobProgress) {
        let job = progress.job();

        if let Some(cache) = &self.cache {
            if cache.has(url) {
                progress.settle(Some(PreloadResponse::Loaded {
                    job,
                    url: url.to_string(),
                }));
                return;
            }
        }

        let Some(_claim) = self.in_flight.claim(url, job) else {
            debug!(url = %url, "already in flight, skipping duplicate");
            progress.settle(None);
            return;
        };

        let outcome = match self.fetcher.fetch(url, progress.token()) {
            Ok(bytes) => self.store(url, &bytes).map(|_| ()),
            Err(e) if e.is_cancelled() => return,
            Err(e) => Err(e.to_string()),
        };

        let msg = match outcome {
            Ok(()) => PreloadResponse::Loaded {
                job,
                url: url.to_string(),
            },
            Err(error) => {
                warn!(url = %url, %error, "preload failed");
                PreloadResponse::Error {
                    job,
                    url: url.to_string(),
                    error,
                }
            }
        };
        progress.settle(Some(msg));
    }

    /// Decode into the attached memory cache, if any.
    fn store(&self, url: &str, bytes: &[u8]) -> Result<Option<ImageHandle>, String> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        let image = ImageHandle::decode(bytes).map_err(|e| format!("decode failed: {}", e))?;
        // Oversized images are logged by the cache and still count as loaded
        let _ = cache.set(url, image.clone());
        Ok(Some(image))
    }
}
