//! Log output setup
//!
//! Logs go to stderr so command output on stdout stays machine-readable.
//! `RUST_LOG` wins over the configured level; `--verbose` raises the
//! configured level to `debug` for this crate.

use tracing_subscriber::EnvFilter;

/// Filter directive for the given configured level and verbosity.
pub fn filter_directive(configured: &str, verbose: bool) -> String {
    let base = configured.trim();
    let base = if base.is_empty() { "warn" } else { base };
    if verbose {
        format!("{},flipcache=debug", base)
    } else {
        base.to_string()
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(configured: &str, verbose: bool) {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(env) if !env.trim().is_empty() => EnvFilter::new(env),
        _ => EnvFilter::try_new(filter_directive(configured, verbose))
            .unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
