//! Tracing subscriber setup.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global fmt subscriber. `RUST_LOG` overrides the configured
/// level.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(config: &LoggingConfig) -> anyhow::Result<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .with_context(|| format!("invalid log level '{}'", config.log_level))?,
    };
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(level = %config.log_level, "logging initialised");
    }
    Ok(installed)
}
