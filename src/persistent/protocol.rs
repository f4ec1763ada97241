//! Control messages for the persistent asset cache.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Instructions accepted by the persistent cache service.
///
/// All but [`CacheCommand::GetCacheStatus`] are fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheCommand {
    /// Store every URL in `pages` that is not cached yet.
    CacheFlipbookPages { pages: Vec<String> },
    /// Look up a catalog and store its first `count` page images.
    PrecacheFirstPages {
        #[serde(rename = "catalogId")]
        catalog_id: String,
        count: usize,
    },
    /// Remove every cache.
    ClearCache,
    /// Ask for a [`CacheReply::CacheStatus`].
    GetCacheStatus,
}

/// Replies sent by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheReply {
    /// Cache name to entry count.
    CacheStatus { payload: BTreeMap<String, usize> },
}
