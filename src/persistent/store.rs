//! On-disk asset store.
//!
//! Layout: `<root>/<version>-<kind>/<blake3(url)>`. Each named cache is a
//! directory, each entry a file holding the response body. Writes go to a
//! temporary `.part` file and are renamed into place, so readers only ever
//! see complete bodies.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, trace};

/// Prefix shared by every cache generation. Old generations are purged.
pub const CACHE_FAMILY_PREFIX: &str = "flipbook-";

/// Default cache generation.
pub const DEFAULT_VERSION: &str = "flipbook-v2";

/// Which named cache an asset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    /// Page images
    Flipbook,
    /// Backend JSON responses
    Api,
}

impl CacheKind {
    fn suffix(self) -> &'static str {
        match self {
            CacheKind::Flipbook => "flipbook",
            CacheKind::Api => "api",
        }
    }

    /// `/api/` paths are backend responses, everything else is an image.
    pub fn for_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if path.contains("/api/") {
            CacheKind::Api
        } else {
            CacheKind::Flipbook
        }
    }
}

/// Persistent, versioned asset store on the local filesystem.
#[derive(Debug)]
pub struct DiskAssetStore {
    root: PathBuf,
    version: String,
    next_tmp: AtomicU64,
}

impl DiskAssetStore {
    /// Open the store, creating `root` and purging stale cache generations.
    pub fn open(root: impl Into<PathBuf>, version: &str) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let store = Self {
            root,
            version: version.to_string(),
            next_tmp: AtomicU64::new(0),
        };
        store.purge_stale_versions()?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn cache_name(&self, kind: CacheKind) -> String {
        format!("{}-{}", self.version, kind.suffix())
    }

    fn cache_dir(&self, kind: CacheKind) -> PathBuf {
        self.root.join(self.cache_name(kind))
    }

    fn entry_path(&self, kind: CacheKind, url: &str) -> PathBuf {
        self.cache_dir(kind)
            .join(blake3::hash(url.as_bytes()).to_hex().as_str())
    }

    /// Directories under the root that belong to the cache family, any
    /// generation. Anything else under the root is left alone.
    fn family_dirs(&self) -> io::Result<Vec<(String, PathBuf)>> {
        let mut dirs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(CACHE_FAMILY_PREFIX) && entry.file_type()?.is_dir() {
                dirs.push((name, entry.path()));
            }
        }
        Ok(dirs)
    }

    fn purge_stale_versions(&self) -> io::Result<()> {
        let current = format!("{}-", self.version);
        for (name, path) in self.family_dirs()? {
            if !name.starts_with(&current) {
                info!(cache = %name, "deleting old cache");
                fs::remove_dir_all(path)?;
            }
        }
        Ok(())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entry_path(CacheKind::for_url(url), url).is_file()
    }

    /// Cached body for `url`, if present.
    pub fn get(&self, url: &str) -> io::Result<Option<Vec<u8>>> {
        self.get_in(CacheKind::for_url(url), url)
    }

    /// Like [`get`](Self::get), reading from the named cache `kind`.
    pub fn get_in(&self, kind: CacheKind, url: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.entry_path(kind, url)) {
            Ok(bytes) => {
                trace!(url = %url, "persistent cache hit");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Store `bytes` as the body for `url`, replacing any previous body.
    pub fn put(&self, url: &str, bytes: &[u8]) -> io::Result<()> {
        self.put_in(CacheKind::for_url(url), url, bytes)
    }

    /// Like [`put`](Self::put), writing into the named cache `kind`.
    pub fn put_in(&self, kind: CacheKind, url: &str, bytes: &[u8]) -> io::Result<()> {
        let dir = self.cache_dir(kind);
        fs::create_dir_all(&dir)?;

        let target = self.entry_path(kind, url);
        let n = self.next_tmp.fetch_add(1, Ordering::Relaxed);
        let tmp = target.with_extension(format!("part-{}-{}", std::process::id(), n));
        fs::write(&tmp, bytes)?;
        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        debug!(url = %url, bytes = bytes.len(), cache = %self.cache_name(kind), "stored");
        Ok(())
    }

    pub fn remove(&self, url: &str) -> io::Result<bool> {
        match fs::remove_file(self.entry_path(CacheKind::for_url(url), url)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete every named cache of the family, any generation.
    pub fn clear(&self) -> io::Result<()> {
        for (_, path) in self.family_dirs()? {
            fs::remove_dir_all(path)?;
        }
        info!("all caches cleared");
        Ok(())
    }

    /// Entry count per named cache.
    pub fn status(&self) -> io::Result<BTreeMap<String, usize>> {
        let mut status = BTreeMap::new();
        for (name, path) in self.family_dirs()? {
            let count = fs::read_dir(path)?
                .filter_map(Result::ok)
                .filter(|e| !e.file_name().to_string_lossy().contains(".part"))
                .count();
            status.insert(name, count);
        }
        Ok(status)
    }
}
