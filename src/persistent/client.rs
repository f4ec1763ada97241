//! Client handle for the persistent cache service.

use std::collections::BTreeMap;
use std::sync::mpsc::{channel, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use super::protocol::{CacheCommand, CacheReply};
use super::service::{Envelope, PersistentCacheService};

/// Talks to a [`PersistentCacheService`] running on its own thread.
///
/// The collaborator may be missing entirely ([`PersistentCacheClient::absent`]);
/// every method then degrades to a silent no-op so callers fall back to
/// in-memory caching only.
pub struct PersistentCacheClient {
    tx: Option<Sender<Envelope>>,
    handle: Option<JoinHandle<()>>,
}

impl PersistentCacheClient {
    /// A client with no service behind it.
    pub fn absent() -> Self {
        Self {
            tx: None,
            handle: None,
        }
    }

    /// Start `service` on a background thread.
    pub fn spawn(service: PersistentCacheService) -> Self {
        let (tx, rx) = channel();
        match thread::Builder::new()
            .name("persistent-cache".to_string())
            .spawn(move || service.run(rx))
        {
            Ok(handle) => Self {
                tx: Some(tx),
                handle: Some(handle),
            },
            Err(e) => {
                warn!(error = %e, "could not start persistent cache service");
                Self::absent()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.tx.is_some()
    }

    fn send(&self, command: CacheCommand, reply: Option<Sender<CacheReply>>) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        if tx.send(Envelope { command, reply }).is_err() {
            debug!("persistent cache service gone");
            return false;
        }
        true
    }

    /// Fire-and-forget. Returns whether the command was delivered.
    pub fn post(&self, command: CacheCommand) -> bool {
        self.send(command, None)
    }

    pub fn cache_pages(&self, pages: Vec<String>) -> bool {
        self.post(CacheCommand::CacheFlipbookPages { pages })
    }

    pub fn precache_first_pages(&self, catalog_id: &str, count: usize) -> bool {
        self.post(CacheCommand::PrecacheFirstPages {
            catalog_id: catalog_id.to_string(),
            count,
        })
    }

    pub fn clear(&self) -> bool {
        self.post(CacheCommand::ClearCache)
    }

    /// Entry count per named cache. `None` when the service is absent or
    /// does not answer within `timeout`.
    ///
    /// Commands are handled in order, so the status reflects every command
    /// posted before it.
    pub fn status(&self, timeout: Duration) -> Option<BTreeMap<String, usize>> {
        let (reply_tx, reply_rx) = channel();
        if !self.send(CacheCommand::GetCacheStatus, Some(reply_tx)) {
            return None;
        }
        match reply_rx.recv_timeout(timeout) {
            Ok(CacheReply::CacheStatus { payload }) => Some(payload),
            Err(e) => {
                debug!(error = %e, "no cache status reply");
                None
            }
        }
    }

    /// Wait for queued commands to finish and stop the service.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PersistentCacheClient {
    fn drop(&mut self) {
        self.stop();
    }
}
