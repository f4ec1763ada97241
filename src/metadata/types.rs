//! Records returned by the catalog backend.

use serde::{Deserialize, Deserializer, Serialize};

use crate::geometry::PercentRect;

/// One page of a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    pub page_number: u32,
    pub image_url: String,
}

/// Interactive region on a page, expressed in percent of the page image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    /// 1-based; `0` when the backend omitted it
    #[serde(default)]
    pub page_number: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub z_index: i32,
}

/// Where activating a hotspot leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HotspotTarget {
    /// Absolute `http(s)` link, opened outside the viewer
    External { url: String },
    /// Site-relative link
    Internal { path: String },
    /// Product lookup by SKU
    Product { sku: String },
}

impl Hotspot {
    /// The hotspot's rectangle, clamped to `[0, 100]` on every field.
    pub fn percent_rect(&self) -> PercentRect {
        PercentRect::new(self.x, self.y, self.width, self.height).clamped()
    }

    /// Link URLs win over product SKUs. Blank values count as absent.
    pub fn target(&self) -> Option<HotspotTarget> {
        if let Some(link) = non_blank(&self.link_url) {
            return Some(if link.starts_with("http") {
                HotspotTarget::External {
                    url: link.to_string(),
                }
            } else {
                HotspotTarget::Internal {
                    path: link.to_string(),
                }
            });
        }
        non_blank(&self.product_sku).map(|sku| HotspotTarget::Product {
            sku: sku.to_string(),
        })
    }

    pub fn is_interactive(&self) -> bool {
        self.target().is_some()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Product search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Backends disagree on whether ids are strings or numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn de_opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|id| id.map(String::from))
}
