//! Tracing bootstrap.
//!
//! The container itself only emits `tracing` events; installing a
//! subscriber is the host's job. This helper covers the common case.

use tracing_subscriber::EnvFilter;

/// Installs a formatted subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` when the variable is unset or invalid.
///
/// Returns `false` if a global subscriber was already installed, which makes
/// the call safe to repeat from tests.
///
/// ```
/// wiring_support::telemetry::init_tracing("wiring=debug");
/// ```
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
