//! Local structured logging for extension processes.
//!
//! Extensions inherit stderr from the host editor, so the subscriber writes
//! there and never to stdout. Lines meant for the host's own log go through
//! [`crate::HostLogger`] instead.

use std::io::{self, IsTerminal};

use mimsy_config::{Config, LogFormat};
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Format of the subscriber installed by the first successful call.
static INSTALLED_FORMAT: OnceCell<LogFormat> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Output format of the subscriber that is actually installed.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured log filter expression did not parse.
    #[error("invalid log filter '{filter}': {reason}")]
    Filter {
        /// Filter text as configured.
        filter: String,
        /// Parser diagnostic.
        reason: String,
    },
    /// The global subscriber could not be installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global stderr subscriber on first use.
///
/// An extension process has one subscriber for its whole life. Later calls
/// install nothing and hand back the format that is already in force, even
/// when their configuration asks for another one.
///
/// # Examples
///
/// ```rust
/// use mimsy_config::{Config, LogFormat};
/// use mimsy_extension::telemetry;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let json = Config::load_from_iter(["echo", "--log-format", "json"])?;
/// let first = telemetry::initialise(&json)?;
/// assert_eq!(first.format(), LogFormat::Json);
///
/// let compact = Config::load_from_iter(["echo", "--log-filter", "mimsy=debug"])?;
/// let second = telemetry::initialise(&compact)?;
/// assert_eq!(second.format(), LogFormat::Json);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable filter and
/// [`TelemetryError::Subscriber`] when another subscriber is already global.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED_FORMAT
        .get_or_try_init(|| install_subscriber(config).map(|()| config.log_format()))
        .map(|&format| TelemetryHandle { format })
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_new(config.log_filter()).map_err(|error| TelemetryError::Filter {
            filter: config.log_filter().to_owned(),
            reason: error.to_string(),
        })?;

    let builder = |env_filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_level(true)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
