//! Tracing subscriber setup for hosts and tests.

use tracing_subscriber::{fmt, EnvFilter};

pub use tracing_subscriber::filter::ParseError;

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `default_filter`.
///
/// Returns `Ok(false)` if a global subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> Result<bool, ParseError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };

    let installed = fmt().with_env_filter(filter).with_target(true).try_init().is_ok();
    if installed {
        tracing::debug!(default_filter, "Tracing initialized");
    }
    Ok(installed)
}
