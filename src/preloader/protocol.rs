//! Request/response messages for the background preloader
//!
//! Messages serialize as JSON objects tagged by `type`, e.g.
//! `{"type":"PRELOAD","urls":[...],"priority":"high"}` and
//! `{"type":"PROGRESS","job":3,"loaded":2,"total":5}`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned to each accepted preload job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Scheduling priority of a queued job. Higher runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// Instructions accepted by the preloader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreloadRequest {
    /// Fetch `urls` in order, `concurrency` at a time.
    Preload {
        urls: Vec<String>,
        #[serde(default)]
        priority: Priority,
        /// Overrides the preloader's default chunk size
        #[serde(default, skip_serializing_if = "Option::is_none")]
        concurrency: Option<usize>,
    },
    /// Abort every job submitted so far.
    Cancel,
}

impl PreloadRequest {
    pub fn preload(urls: Vec<String>) -> Self {
        PreloadRequest::Preload {
            urls,
            priority: Priority::Normal,
            concurrency: None,
        }
    }
}

/// Events emitted by the preloader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreloadResponse {
    /// One URL was fetched completely.
    Loaded { job: JobId, url: String },
    /// One URL failed; sibling fetches are unaffected.
    Error {
        job: JobId,
        url: String,
        error: String,
    },
    /// Emitted after every settled URL; `loaded` counts successes and failures.
    Progress {
        job: JobId,
        loaded: usize,
        total: usize,
    },
    /// Every URL of the job has settled.
    Completed {
        job: JobId,
        loaded: usize,
        failed: usize,
    },
    /// The job was cancelled; no further events follow for it.
    Cancelled { job: JobId },
}

impl PreloadResponse {
    pub fn job(&self) -> JobId {
        match self {
            PreloadResponse::Loaded { job, .. }
            | PreloadResponse::Error { job, .. }
            | PreloadResponse::Progress { job, .. }
            | PreloadResponse::Completed { job, .. }
            | PreloadResponse::Cancelled { job } => *job,
        }
    }

    /// True for the last event a job emits.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PreloadResponse::Completed { .. } | PreloadResponse::Cancelled { .. }
        )
    }
}
