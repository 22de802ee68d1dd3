use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Loopback address the host editor listens on for extensions.
pub const DEFAULT_HOST_ADDRESS: &str = "127.0.0.1";

/// TCP port the host editor listens on for extensions.
pub const DEFAULT_HOST_PORT: u16 = 5331;

/// Default endpoint rendered as text, as accepted by `--host-endpoint`.
pub const DEFAULT_HOST_ENDPOINT: &str = "tcp://127.0.0.1:5331";

/// Default log filter expression used by extension binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Upper bound on a single frame's payload unless configured otherwise.
pub const DEFAULT_MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Computes the default host endpoint.
#[must_use]
pub fn default_host_endpoint() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_HOST_ADDRESS, DEFAULT_HOST_PORT)
}

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}
