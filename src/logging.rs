//! Application logging setup.
//!
//! Maps the CLI's `-v`/`-q` flags onto a tracing subscriber. `RUST_LOG`
//! overrides the flag-derived level when set.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
pub fn init(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
