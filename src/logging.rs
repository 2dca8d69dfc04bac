//! Logging setup
//!
//! Host applications that do not install their own tracing subscriber can
//! call `init_logging()` once at startup. Filtering follows `RUST_LOG`
//! (default `info`). Set `RUST_LOG=toolgate::bus=debug` together with a
//! debug-enabled bus to see every published message.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber
///
/// Safe to call more than once; later calls are no-ops because a global
/// subscriber may only be installed once per process.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
