//! Network fetch seam
//!
//! Everything that touches the network goes through the [`Fetcher`] trait so
//! the preloader, the image cache and the persistent store can be driven by
//! an in-memory fake in tests. Cancellation is cooperative: a fetcher checks
//! its [`CancelToken`] before issuing the request and between body reads.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::trace;

/// Size of a single body read between cancellation checks.
const READ_CHUNK: usize = 64 * 1024;

/// Shared cancellation flag.
///
/// Clones observe the same flag. Once cancelled a token stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Return `Err(FetchError::Cancelled)` if the token has fired.
    pub fn check(&self) -> Result<(), FetchError> {
        if self.is_cancelled() {
            Err(FetchError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Errors produced by a [`Fetcher`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request cancelled")]
    Cancelled,

    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

/// Fetches the full body of a URL.
///
/// Implementors must be usable from several threads at once.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, cancel: &CancelToken) -> Result<Vec<u8>, FetchError>;

    /// Fetch a backend JSON response. Caching layers file it with the API
    /// responses whatever its path looks like.
    fn fetch_api(&self, url: &str, cancel: &CancelToken) -> Result<Vec<u8>, FetchError> {
        self.fetch(url, cancel)
    }
}

impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    fn fetch(&self, url: &str, cancel: &CancelToken) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url, cancel)
    }

    fn fetch_api(&self, url: &str, cancel: &CancelToken) -> Result<Vec<u8>, FetchError> {
        (**self).fetch_api(url, cancel)
    }
}

/// Blocking HTTP fetcher backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    auth_header: Option<String>,
}

impl HttpFetcher {
    /// Build a fetcher with an optional `Authorization` header value.
    pub fn new(auth_header: Option<String>) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            auth_header: auth_header.filter(|h| !h.is_empty()),
        })
    }

    #[cfg(test)]
    pub(crate) fn auth_header(&self) -> Option<&str> {
        self.auth_header.as_deref()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, cancel: &CancelToken) -> Result<Vec<u8>, FetchError> {
        cancel.check()?;

        let mut request = self.client.get(url);
        if let Some(auth) = &self.auth_header {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }
        let mut response = request
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        // Cancellation is checked between chunks
        let mut body = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            cancel.check()?;
            let n = response.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }

        trace!(url = %url, bytes = body.len(), "fetched");
        Ok(body)
    }
}
