//! Tracing setup for tests.

use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber writing to the test harness.
///
/// Honors `RUST_LOG` (default `info`). Safe to call from every test; only
/// the first call installs anything.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_test_writer()
        .try_init();
}
