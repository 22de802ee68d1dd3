//! Binary entrypoint for the echo extension.

use std::io::{self, Write};
use std::process::ExitCode;

use mimsy_echo_extension::{build_registry, identity};
use mimsy_extension::{HostLogger, run_extension};

fn main() -> ExitCode {
    let logger = HostLogger::new();
    match build_registry(&logger) {
        Ok(registry) => run_extension(std::env::args_os(), registry, logger, identity),
        Err(error) => {
            writeln!(io::stderr().lock(), "{error}").ok();
            ExitCode::FAILURE
        }
    }
}
