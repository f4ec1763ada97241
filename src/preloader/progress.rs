//! Per-job progress accounting.
//!
//! Completions arrive from several pool threads at once. Counting and
//! sending happen under one gate mutex so `PROGRESS.loaded` leaves the
//! preloader as 1, 2, ..., N with no reordering, and so a cancellation
//! (which takes the same gate) cleanly separates "reported" from "silent".

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

use super::protocol::{JobId, PreloadResponse};
use crate::fetch::CancelToken;

/// Outbound side of the response channel, shared by all jobs.
#[derive(Clone)]
pub(crate) struct Emitter {
    tx: Sender<PreloadResponse>,
    gate: Arc<Mutex<()>>,
}

impl Emitter {
    pub(crate) fn new(tx: Sender<PreloadResponse>) -> Self {
        Self {
            tx,
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Hold the gate; no job can report while the guard lives.
    pub(crate) fn hold(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Send outside of any job accounting (terminal notices).
    pub(crate) fn send(&self, msg: PreloadResponse) {
        // Receiver may have been dropped by a consumer that lost interest
        let _ = self.tx.send(msg);
    }
}

/// Progress of one running job.
pub(crate) struct JobProgress {
    job: JobId,
    total: usize,
    loaded: AtomicUsize,
    failed: AtomicUsize,
    token: CancelToken,
    emitter: Emitter,
}

impl JobProgress {
    pub(crate) fn new(job: JobId, total: usize, token: CancelToken, emitter: Emitter) -> Self {
        Self {
            job,
            total,
            loaded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            token,
            emitter,
        }
    }

    pub(crate) fn job(&self) -> JobId {
        self.job
    }

    pub(crate) fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Record one settled URL.
    ///
    /// Sends `outcome` (if any) followed by a `PROGRESS` event. Returns
    /// `false` without sending anything once the job is cancelled.
    pub(crate) fn settle(&self, outcome: Option<PreloadResponse>) -> bool {
        let _gate = self.emitter.hold();
        if self.token.is_cancelled() {
            return false;
        }

        if let Some(msg) = outcome {
            if matches!(msg, PreloadResponse::Error { .. }) {
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
            self.emitter.send(msg);
        }

        let loaded = self.loaded.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(job = self.job.0, loaded, total = self.total, "progress");
        self.emitter.send(PreloadResponse::Progress {
            job: self.job,
            loaded,
            total: self.total,
        });
        true
    }

    /// Current (loaded, total).
    pub(crate) fn get_progress(&self) -> (usize, usize) {
        (self.loaded.load(Ordering::SeqCst), self.total)
    }

    /// Emit the job's terminal event.
    pub(crate) fn finish(&self) {
        let _gate = self.emitter.hold();
        let msg = if self.token.is_cancelled() {
            PreloadResponse::Cancelled { job: self.job }
        } else {
            PreloadResponse::Completed {
                job: self.job,
                loaded: self.loaded.load(Ordering::SeqCst),
                failed: self.failed.load(Ordering::SeqCst),
            }
        };
        self.emitter.send(msg);
    }
}
