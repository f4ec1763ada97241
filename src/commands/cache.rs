//! Cache subcommands handler

use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::time::Duration;

use flipcache::Config;

use super::Backend;

const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

/// Print entry counts per named cache.
#[cfg(not(tarpaulin_include))]
pub fn handle_status() -> Result<()> {
    let backend = Backend::connect(Config::load()?)?;
    let client = backend.persistent_client();
    if !client.is_available() {
        println!("Persistent cache disabled or unavailable.");
        return Ok(());
    }
    match client.status(STATUS_TIMEOUT) {
        Some(status) => print!("{}", format_status(&status)),
        None => bail!("Persistent cache did not report its status"),
    }
    Ok(())
}

/// Delete every persistent cache.
#[cfg(not(tarpaulin_include))]
pub fn handle_clear() -> Result<()> {
    let backend = Backend::connect(Config::load()?)?;
    let client = backend.persistent_client();
    if client.clear() {
        client.shutdown();
        println!("Persistent cache cleared.");
    } else {
        println!("Persistent cache disabled or unavailable.");
    }
    Ok(())
}

/// Store the first `count` pages of `catalog` on disk.
#[cfg(not(tarpaulin_include))]
pub fn handle_warm(catalog: &str, count: usize) -> Result<()> {
    let backend = Backend::connect(Config::load()?)?;
    let client = backend.persistent_client();
    if !client.precache_first_pages(catalog, count) {
        println!("Persistent cache disabled or unavailable.");
        return Ok(());
    }
    // Status is answered after the pre-cache command has finished
    match client.status(Duration::from_secs(300)) {
        Some(status) => print!("{}", format_status(&status)),
        None => bail!("Persistent cache did not finish warming"),
    }
    Ok(())
}

fn format_status(status: &BTreeMap<String, usize>) -> String {
    if status.is_empty() {
        return "No caches.\n".to_string();
    }
    let width = status.keys().map(|k| k.len()).max().unwrap_or(0);
    status
        .iter()
        .map(|(name, count)| format!("{:<width$}  {}\n", name, count, width = width))
        .collect()
}
