//! Process entry point shared by extension binaries.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

use mimsy_config::Config;
use tracing::error;

use crate::diagnostics::HostLogger;
use crate::dispatch::{ExtensionInfo, dispatch_events};
use crate::registry::HandlerRegistry;
use crate::telemetry;

const DRIVER_TARGET: &str = "mimsy_extension::driver";

/// Loads configuration from `args`, starts local logging and runs the
/// session with the host until it ends.
///
/// The session only ends on failure, so a returned [`ExitCode::SUCCESS`]
/// means `--help` or `--version` was requested. Fatal errors are written to
/// stderr.
///
/// ```no_run
/// use mimsy_extension::{ExtensionInfo, HandlerRegistry, HostLogger, run_extension};
///
/// fn main() -> std::process::ExitCode {
///     let logger = HostLogger::new();
///     let mut registry = HandlerRegistry::new();
///     registry.register("on_save", || {}).unwrap();
///     run_extension(std::env::args_os(), registry, logger, || {
///         ExtensionInfo::new("demo-ext", "1.0", "http://example.test")
///     })
/// }
/// ```
#[must_use]
pub fn run_extension<I, T, L>(
    args: I,
    registry: HandlerRegistry<'_>,
    logger: HostLogger,
    loading: L,
) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    L: FnOnce() -> ExtensionInfo,
{
    let config = match Config::load_from_iter(args) {
        Ok(config) => config,
        Err(clap_error) => {
            clap_error.print().ok();
            return if clap_error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(telemetry_error) = telemetry::initialise(&config) {
        writeln!(io::stderr().lock(), "{telemetry_error}").ok();
        return ExitCode::FAILURE;
    }

    let Err(session_error) = dispatch_events(&config, registry, logger, loading);
    error!(
        target: DRIVER_TARGET,
        category = session_error.category(),
        error = %session_error,
        "extension stopped"
    );
    writeln!(io::stderr().lock(), "{session_error}").ok();
    ExitCode::FAILURE
}
