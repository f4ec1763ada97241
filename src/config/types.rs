//! Configuration type definitions and defaults

use serde::{Deserialize, Serialize};

use crate::image_cache::{DEFAULT_MAX_ENTRIES, DEFAULT_MAX_BYTES};
use crate::persistent::DEFAULT_VERSION;
use crate::preloader::DEFAULT_CONCURRENCY;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub memory_cache: MemoryCacheConfig,
    #[serde(default)]
    pub preload: PreloadConfig,
    #[serde(default)]
    pub persistent_cache: PersistentCacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Catalog backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Root URL of the metadata provider
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value sent as the `Authorization` header; empty disables it
    #[serde(default)]
    pub auth_header: String,
}

pub fn default_base_url() -> String {
    "http://localhost:3001".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_header: String::new(),
        }
    }
}

/// In-memory image cache budgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: f64,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

pub fn default_max_size_mb() -> f64 {
    (DEFAULT_MAX_BYTES / (1024 * 1024)) as f64
}

pub fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_size_mb: default_max_size_mb(),
            max_entries: default_max_entries(),
        }
    }
}

/// Background preloading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadConfig {
    /// Simultaneous fetches per chunk
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Pages after the current one the viewer keeps warm
    #[serde(default = "default_preload_ahead")]
    pub preload_ahead: usize,
    /// Pages before the current one the viewer keeps warm
    #[serde(default = "default_preload_behind")]
    pub preload_behind: usize,
}

pub fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

pub fn default_preload_ahead() -> usize {
    2
}

pub fn default_preload_behind() -> usize {
    1
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            preload_ahead: default_preload_ahead(),
            preload_behind: default_preload_behind(),
        }
    }
}

/// On-disk asset cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentCacheConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Cache root; a leading `~/` is expanded
    #[serde(default = "default_cache_directory")]
    pub directory: String,
    /// Cache generation prefix; other `flipbook-*` generations are purged
    #[serde(default = "default_cache_version")]
    pub version: String,
}

pub fn default_enabled() -> bool {
    true
}

pub fn default_cache_directory() -> String {
    "~/.cache/flipcache".to_string()
}

pub fn default_cache_version() -> String {
    DEFAULT_VERSION.to_string()
}

impl Default for PersistentCacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            directory: default_cache_directory(),
            version: default_cache_version(),
        }
    }
}

/// Log output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
}

pub fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
