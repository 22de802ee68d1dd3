//! Shared configuration for Mimsy extension processes.
//!
//! An extension is launched by the host editor and connects back to it over a
//! private socket. The values here decide where that socket lives, how the
//! extension logs locally, and a few protocol knobs. Every value is layered:
//! command-line flag first, then the matching `MIMSY_*` environment variable,
//! then the built-in default.

mod defaults;
mod logging;
mod socket;

use std::ffi::OsString;

use clap::Parser;

pub use defaults::{
    DEFAULT_HOST_ADDRESS, DEFAULT_HOST_ENDPOINT, DEFAULT_HOST_PORT, DEFAULT_LOG_FILTER,
    DEFAULT_MAX_FRAME_LEN, default_host_endpoint, default_log_filter, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError};

/// Runtime configuration of an extension process.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "mimsy-extension",
    about = "Out-of-process extension for the Mimsy editor",
    version
)]
pub struct Config {
    /// Endpoint of the host editor's extension socket.
    #[arg(
        long,
        env = "MIMSY_HOST_ENDPOINT",
        value_name = "URL",
        default_value = DEFAULT_HOST_ENDPOINT
    )]
    host_endpoint: SocketEndpoint,

    /// Filter expression for local stderr logging (for example `debug`).
    #[arg(long, env = "MIMSY_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    log_filter: String,

    /// Format of local stderr logging.
    #[arg(long, env = "MIMSY_LOG_FORMAT", default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Sends `notification_completed` after the registration reply.
    #[arg(long, env = "MIMSY_ACKNOWLEDGE_REGISTRATION")]
    acknowledge_registration: bool,

    /// Largest frame payload accepted from the host, in bytes.
    #[arg(
        long,
        env = "MIMSY_MAX_FRAME_LEN",
        value_name = "BYTES",
        default_value_t = DEFAULT_MAX_FRAME_LEN,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    max_frame_len: u32,
}

impl Config {
    /// Parses configuration from an argument iterator, falling back to the
    /// environment and then to defaults.
    ///
    /// # Errors
    ///
    /// Returns the `clap` error describing the rejected argument. Help and
    /// version requests are also surfaced as errors, as `clap` does.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// Endpoint of the host editor.
    #[must_use]
    pub const fn host_endpoint(&self) -> &SocketEndpoint {
        &self.host_endpoint
    }

    /// Local log filter expression.
    #[must_use]
    pub const fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Local log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Whether the registration reply is followed by a completion frame.
    #[must_use]
    pub const fn acknowledge_registration(&self) -> bool {
        self.acknowledge_registration
    }

    /// Largest accepted frame payload.
    #[must_use]
    pub const fn max_frame_len(&self) -> u32 {
        self.max_frame_len
    }

    /// Replaces the host endpoint.
    #[must_use]
    pub fn with_host_endpoint(mut self, endpoint: SocketEndpoint) -> Self {
        self.host_endpoint = endpoint;
        self
    }

    /// Replaces the registration acknowledgment setting.
    #[must_use]
    pub const fn with_acknowledge_registration(mut self, acknowledge: bool) -> Self {
        self.acknowledge_registration = acknowledge;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host_endpoint: default_host_endpoint(),
            log_filter: default_log_filter().to_owned(),
            log_format: default_log_format(),
            acknowledge_registration: false,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}
