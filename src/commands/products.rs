//! Products command handler

use anyhow::Result;

use flipcache::metadata::MetadataProvider;
use flipcache::Config;

use super::Backend;

/// Search products by name or SKU.
#[cfg(not(tarpaulin_include))]
pub fn handle(term: &str) -> Result<()> {
    let backend = Backend::connect(Config::load()?)?;
    let products = backend.metadata.search_products(term)?;
    if products.is_empty() {
        println!("No products found.");
        return Ok(());
    }
    for product in products {
        println!(
            "{:<16} {}",
            product.sku.as_deref().unwrap_or("-"),
            product.name
        );
    }
    Ok(())
}
