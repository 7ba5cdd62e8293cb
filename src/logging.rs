//! Logging initialisation.
//!
//! Diagnostics go to stderr because stdout carries the masked record
//! stream. The level comes from the `--log-level` flag and can be
//! overridden per module through `RUST_LOG` syntax.

use tracing_subscriber::EnvFilter;

pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
