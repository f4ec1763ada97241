//! CLI definitions for flipcache
//!
//! This module contains the clap CLI structure definitions, separated from
//! main.rs so the command handlers stay small.

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};

/// Build clap styles.
pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[derive(Parser)]
#[command(name = "flipcache")]
#[command(about = "[ flipcache ] - preload, cache and project flipbook catalog assets")]
#[command(
    long_about = "flipcache - asset delivery and caching for interactive flipbook catalogs.

Loads catalogs from the catalog backend, preloads page images into a bounded
in-memory cache (and an on-disk persistent cache), and projects hotspot
rectangles between percent and pixel space.

QUICK START:
    flipcache load spring-2025              Load a catalog and report progress
    flipcache hotspots spring-2025 3 --width 800 --height 600
    flipcache cache warm spring-2025        Pre-cache the first pages on disk
    flipcache cache status                  Entry counts per persistent cache

Configuration lives in ~/.config/flipcache/config.toml."
)]
#[command(version)]
#[command(styles = build_cli_styles())]
pub struct Cli {
    /// Enable debug logging for flipcache
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a catalog: metadata, image preload, engine start
    #[command(long_about = "Run the full catalog loading sequence.

Fetches the page list, preloads page images through the background
preloader and reports progress until the catalog is ready. Failed images
are reported but do not fail the load. Press Ctrl+C to cancel preloading.

EXAMPLES:
    flipcache load spring-2025
    flipcache load spring-2025 --preload-count 4
    flipcache load spring-2025 --json")]
    Load {
        /// Catalog (flipbook) identifier
        catalog: String,
        /// Only preload the first N pages
        #[arg(long)]
        preload_count: Option<usize>,
        /// Override the configured fetch concurrency
        #[arg(long)]
        concurrency: Option<usize>,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a percent rectangle into container pixels
    #[command(long_about = "Project a percentage rectangle into a container.

Each field is clamped independently to the container, so x + width may
exceed the container width.

EXAMPLES:
    flipcache project --x 10 --y 20 --width 30 --height 40 \\
        --container-width 800 --container-height 600
    flipcache project --x 150 --y -10 --width 50 --height 50 \\
        --container-width 100 --container-height 100")]
    Project(ProjectArgs),

    /// Fetch a page's hotspots and project them into a container
    Hotspots {
        /// Catalog (flipbook) identifier
        catalog: String,
        /// 1-based page number
        page: u32,
        /// Container width in pixels
        #[arg(long)]
        width: f64,
        /// Container height in pixels
        #[arg(long)]
        height: f64,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Search products by name or SKU
    Products {
        /// Search term
        term: String,
    },

    /// Persistent cache control
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub x: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub y: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub width: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub height: f64,
    #[arg(long)]
    pub container_width: f64,
    #[arg(long)]
    pub container_height: f64,
    /// Snap the percent input to the 0.5 grid first
    #[arg(long)]
    pub snap: bool,
    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Entry count per named cache
    Status,
    /// Delete every persistent cache
    Clear,
    /// Store the first pages of a catalog on disk
    Warm {
        /// Catalog (flipbook) identifier
        catalog: String,
        /// Number of pages to store
        #[arg(long, default_value_t = 3)]
        count: usize,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration as TOML
    Show,
    /// Print the config file path
    Path,
}
