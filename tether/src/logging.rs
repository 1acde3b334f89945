//! Subscriber setup for binaries and tests.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a formatted subscriber with timestamps, levels and targets.
///
/// `RUST_LOG` takes precedence over `default_filter` (e.g. `"tether=info"`).
///
/// # Errors
///
/// If a global subscriber is already installed.
pub fn init_logging(default_filter: &str) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true))
        .with(filter)
        .try_init()
}
