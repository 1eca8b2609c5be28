//! Log output for the `suite` binary.
//!
//! Reports and rendered tables go to stdout; every log line goes to stderr so
//! `suite --output json run` can be piped without filtering. The level comes
//! from `RUST_LOG` when set, else from `[general] log_level` (already merged
//! with `--log-level` by the caller).

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use suite_core::config::GeneralConfig;

use crate::error::CliError;

/// Install the process-wide subscriber for one `suite` invocation.
///
/// `log_format` picks `json` lines for CI collectors or `pretty` for a
/// terminal. Any other value is a configuration error and nothing is installed.
pub fn init_tracing(config: &GeneralConfig) -> Result<(), CliError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.log_format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        "pretty" => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        other => {
            return Err(CliError::Config(format!(
                "unknown log format '{other}', expected 'json' or 'pretty'"
            )));
        }
    };

    installed.map_err(|e| {
        CliError::Command(format!(
            "could not install {} log subscriber: {e}",
            config.log_format
        ))
    })
}
