//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

/// Initialize tracing/logging for the process.
///
/// Filtering follows `RUST_LOG`, falling back to `info`. Logs are emitted as
/// JSON lines unless `BAZAAR_LOG_PRETTY` is set (human-readable output for
/// local development). Safe to call multiple times (subsequent calls are
/// no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let pretty = std::env::var_os("BAZAAR_LOG_PRETTY").is_some();
    let _ = if pretty {
        builder.try_init()
    } else {
        builder.json().try_init()
    };
}
