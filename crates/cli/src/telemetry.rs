//! Logging setup for the `cinema-jobs` binary

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::settings::{LogFormat, LoggingSettings};

/// Install the global subscriber
///
/// `RUST_LOG` wins when set; otherwise every `cinema*` target logs at the
/// configured level. Logs go to stderr so stdout stays free for the result table.
///
/// # Example
///
/// ```text
/// RUST_LOG=cinema_core=debug cinema-jobs export 15-01-2025
/// CINEMA__LOGGING__FORMAT=json cinema-jobs sweep
/// ```
pub fn init_logging(settings: &LoggingSettings) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(settings)))?;

    match settings.format {
        LogFormat::Json => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()?;
        }
        LogFormat::Pretty => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()?;
        }
    }

    Ok(())
}

fn default_directive(settings: &LoggingSettings) -> String {
    format!("cinema={}", settings.level)
}
