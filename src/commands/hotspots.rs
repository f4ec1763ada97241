//! Hotspots command handler

use anyhow::Result;

use flipcache::geometry::Size;
use flipcache::metadata::{HotspotTarget, MetadataProvider};
use flipcache::viewer::{project, ProjectedHotspot};
use flipcache::Config;

use super::Backend;

/// Fetch a page's hotspots and print them projected into the container.
#[cfg(not(tarpaulin_include))]
pub fn handle(catalog: &str, page: u32, width: f64, height: f64, json: bool) -> Result<()> {
    let backend = Backend::connect(Config::load()?)?;
    let hotspots = backend.metadata.list_hotspots(catalog, page)?;
    let projected = project(&hotspots, Size::new(width, height));

    if json {
        println!("{}", serde_json::to_string_pretty(&projected)?);
        return Ok(());
    }

    let skipped = hotspots.len() - projected.len();
    println!(
        "Page {} of {}: {} hotspot(s){}",
        page,
        catalog,
        projected.len(),
        if skipped > 0 {
            format!(" ({} without a target skipped)", skipped)
        } else {
            String::new()
        }
    );
    for hotspot in &projected {
        println!("{}", format_row(hotspot));
    }
    Ok(())
}

fn format_row(hotspot: &ProjectedHotspot) -> String {
    let target = match &hotspot.target {
        HotspotTarget::External { url } => format!("-> {}", url),
        HotspotTarget::Internal { path } => format!("-> {}", path),
        HotspotTarget::Product { sku } => format!("product {}", sku),
    };
    format!(
        "  [z={:>2}] {:<12} {}  {}",
        hotspot.z_index, hotspot.id, hotspot.rect, target
    )
}
