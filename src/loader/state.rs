//! Loading state machine
//!
//! ```text
//! IDLE --begin--> FETCHING_DATA --data_ready--> PRELOADING_IMAGES
//! PRELOADING_IMAGES --images_ready--> INITIALIZING_ENGINE --engine_ready--> READY
//! (any state but ERROR) --fail--> ERROR
//! ```
//!
//! `ERROR` is terminal; recovery means constructing a new machine.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Phase of a catalog load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoaderStatus {
    Idle,
    FetchingData,
    PreloadingImages,
    InitializingEngine,
    Ready,
    Error,
}

impl LoaderStatus {
    /// Text shown to the user while in this phase.
    pub fn status_text(self) -> &'static str {
        match self {
            LoaderStatus::Idle => "Initializing...",
            LoaderStatus::FetchingData => "Loading catalog data...",
            LoaderStatus::PreloadingImages => "Loading images...",
            LoaderStatus::InitializingEngine => "Preparing flipbook...",
            LoaderStatus::Ready => "Ready!",
            LoaderStatus::Error => "Error loading catalog",
        }
    }

    /// Progress on entering the phase; `None` keeps the current value.
    fn entry_progress(self) -> Option<f64> {
        match self {
            LoaderStatus::Idle => Some(0.0),
            LoaderStatus::FetchingData => Some(10.0),
            LoaderStatus::PreloadingImages | LoaderStatus::Error => None,
            LoaderStatus::InitializingEngine => Some(95.0),
            LoaderStatus::Ready => Some(100.0),
        }
    }

    fn wire_name(self) -> &'static str {
        match self {
            LoaderStatus::Idle => "IDLE",
            LoaderStatus::FetchingData => "FETCHING_DATA",
            LoaderStatus::PreloadingImages => "PRELOADING_IMAGES",
            LoaderStatus::InitializingEngine => "INITIALIZING_ENGINE",
            LoaderStatus::Ready => "READY",
            LoaderStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for LoaderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Snapshot handed to observers and the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderState {
    pub status: LoaderStatus,
    /// 0..=100
    pub progress: f64,
    pub status_text: &'static str,
    pub error_message: Option<String>,
}

impl Default for LoaderState {
    fn default() -> Self {
        Self {
            status: LoaderStatus::Idle,
            progress: 0.0,
            status_text: LoaderStatus::Idle.status_text(),
            error_message: None,
        }
    }
}

/// Rejected transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} while {from}")]
pub struct TransitionError {
    pub from: LoaderStatus,
    pub action: &'static str,
}

/// Callback invoked with every new snapshot.
pub type StateObserver = Arc<dyn Fn(&LoaderState) + Send + Sync>;

/// Sequences a catalog load and owns its progress/status presentation.
///
/// Transition methods are the only way to change state.
#[derive(Default)]
pub struct LoadingStateMachine {
    state: LoaderState,
    observers: Vec<StateObserver>,
}

impl fmt::Debug for LoadingStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadingStateMachine")
            .field("state", &self.state)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl LoadingStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: StateObserver) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> &LoaderState {
        &self.state
    }

    pub fn status(&self) -> LoaderStatus {
        self.state.status
    }

    pub fn progress(&self) -> f64 {
        self.state.progress
    }

    pub fn error_message(&self) -> Option<&str> {
        self.state.error_message.as_deref()
    }

    pub fn begin(&mut self) -> Result<(), TransitionError> {
        self.advance("begin", LoaderStatus::Idle, LoaderStatus::FetchingData)
    }

    pub fn data_ready(&mut self) -> Result<(), TransitionError> {
        self.advance(
            "finish fetching data",
            LoaderStatus::FetchingData,
            LoaderStatus::PreloadingImages,
        )
    }

    pub fn images_ready(&mut self) -> Result<(), TransitionError> {
        self.advance(
            "finish preloading images",
            LoaderStatus::PreloadingImages,
            LoaderStatus::InitializingEngine,
        )
    }

    pub fn engine_ready(&mut self) -> Result<(), TransitionError> {
        self.advance(
            "finish initializing engine",
            LoaderStatus::InitializingEngine,
            LoaderStatus::Ready,
        )
    }

    /// Map preloader progress onto 10..=90. A zero total changes nothing.
    pub fn update_progress(&mut self, loaded: usize, total: usize) -> Result<(), TransitionError> {
        if self.state.status != LoaderStatus::PreloadingImages {
            return Err(TransitionError {
                from: self.state.status,
                action: "update image progress",
            });
        }
        if total > 0 {
            let ratio = loaded.min(total) as f64 / total as f64;
            self.state.progress = 10.0 + 80.0 * ratio;
            self.notify();
        }
        Ok(())
    }

    /// Enter `ERROR` with `message`. Terminal.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        if self.state.status == LoaderStatus::Error {
            return Err(TransitionError {
                from: LoaderStatus::Error,
                action: "fail",
            });
        }
        let message = message.into();
        warn!(from = %self.state.status, error = %message, "catalog load failed");
        self.state.error_message = Some(message);
        self.enter(LoaderStatus::Error);
        Ok(())
    }

    fn advance(
        &mut self,
        action: &'static str,
        expected: LoaderStatus,
        next: LoaderStatus,
    ) -> Result<(), TransitionError> {
        if self.state.status != expected {
            return Err(TransitionError {
                from: self.state.status,
                action,
            });
        }
        self.enter(next);
        Ok(())
    }

    fn enter(&mut self, next: LoaderStatus) {
        debug!(from = %self.state.status, to = %next, "loader transition");
        self.state.status = next;
        self.state.status_text = next.status_text();
        if let Some(progress) = next.entry_progress() {
            self.state.progress = progress;
        }
        self.notify();
    }

    fn notify(&self) {
        for observer in &self.observers {
            observer(&self.state);
        }
    }
}
