//! Tracing subscriber setup for the `pagesmith` binary.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::LogConfig;
use crate::error::{PagesmithError, PagesmithResult};

/// Environment variable that overrides `log.filter`.
pub const LOG_ENV: &str = "PAGESMITH_LOG";

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays machine-readable.
pub fn init_tracing(config: &LogConfig) -> PagesmithResult<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|err| PagesmithError::ConfigError(format!("invalid log filter: {err}")))?;

    let registry = Registry::default().with(filter);
    let result = if config.json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|err| PagesmithError::Internal(format!("tracing already initialised: {err}")))
}
