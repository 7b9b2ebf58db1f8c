//! Logging init: tracing to stderr, filtered via `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber. Safe to call more than once; later calls are
/// no-ops.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
