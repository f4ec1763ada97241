//! flipcache - CLI entry point

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use cli::{CacheCommands, Cli, Commands, ConfigCommands};
use flipcache::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // An unreadable config still gets logging; the command reports the error
    let level = Config::load()
        .map(|c| c.logging.level)
        .unwrap_or_else(|_| flipcache::config::default_log_level());
    flipcache::logging::init(&level, cli.verbose);

    match cli.command {
        Commands::Load {
            catalog,
            preload_count,
            concurrency,
            json,
        } => commands::load::handle(&catalog, preload_count, concurrency, json),
        Commands::Project(args) => commands::project::handle(&args),
        Commands::Hotspots {
            catalog,
            page,
            width,
            height,
            json,
        } => commands::hotspots::handle(&catalog, page, width, height, json),
        Commands::Products { term } => commands::products::handle(&term),
        Commands::Cache(cmd) => match cmd {
            CacheCommands::Status => commands::cache::handle_status(),
            CacheCommands::Clear => commands::cache::handle_clear(),
            CacheCommands::Warm { catalog, count } => commands::cache::handle_warm(&catalog, count),
        },
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::handle_show(),
            ConfigCommands::Path => commands::config::handle_path(),
        },
    }
}
