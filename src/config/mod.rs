//! Configuration management for flipcache

mod io;
mod types;

pub use types::*;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::image_cache::CacheLimits;
use crate::viewer::ViewerOptions;

impl Config {
    /// Get the config file path (~/.config/flipcache/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        io::config_path()
    }

    /// Get the config directory path (~/.config/flipcache)
    pub fn config_dir() -> Result<PathBuf> {
        io::config_dir()
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> Result<Self> {
        io::load_from(&io::config_path()?)
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        io::load_from(path)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        io::save_to(self, &io::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        io::save_to(self, path)
    }

    /// Check value ranges. Returns a message naming the offending key.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.preload.concurrency == 0 {
            return Err("preload.concurrency must be at least 1".to_string());
        }
        if self.memory_cache.max_entries == 0 {
            return Err("memory_cache.max_entries must be at least 1".to_string());
        }
        let mb = self.memory_cache.max_size_mb;
        if mb.is_nan() || mb <= 0.0 {
            return Err("memory_cache.max_size_mb must be greater than 0".to_string());
        }
        if self.persistent_cache.version.trim().is_empty() {
            return Err("persistent_cache.version must not be empty".to_string());
        }
        Ok(())
    }

    /// Expand ~ in the persistent cache directory path
    pub fn cache_directory(&self) -> PathBuf {
        let dir = &self.persistent_cache.directory;
        if let Some(stripped) = dir.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        }
        PathBuf::from(dir)
    }

    /// `Authorization` header value, if configured
    pub fn auth_header(&self) -> Option<String> {
        Some(self.api.auth_header.trim().to_string()).filter(|h| !h.is_empty())
    }

    pub fn cache_limits(&self) -> CacheLimits {
        CacheLimits::from_megabytes(self.memory_cache.max_size_mb, self.memory_cache.max_entries)
    }

    pub fn viewer_options(&self) -> ViewerOptions {
        ViewerOptions {
            preload_ahead: self.preload.preload_ahead,
            preload_behind: self.preload.preload_behind,
            ..ViewerOptions::default()
        }
    }
}
