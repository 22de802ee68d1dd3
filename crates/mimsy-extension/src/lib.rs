//! Client runtime for out-of-process Mimsy editor extensions.
//!
//! An extension registers a handler per host notification in a
//! [`HandlerRegistry`] and hands it to [`run_extension`] together with a
//! callback producing its [`ExtensionInfo`]. The runtime connects to the host,
//! answers the registration prompt, then runs each notification's handler
//! and acknowledges it, one at a time, until the session fails.
//!
//! Handlers report to the host's log through a [`HostLogger`]; local
//! diagnostics go to stderr through `tracing`.
//!
//! [`DispatchLoop`] and [`dispatch_events`] expose the same machinery for
//! callers that manage their own process lifecycle or streams.

pub mod diagnostics;
pub mod dispatch;
mod driver;
pub mod error;
pub mod registry;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
mod tests;

pub use self::diagnostics::HostLogger;
pub use self::dispatch::{
    DispatchLoop, DispatchOptions, ERROR_TOPIC, EXTENSIONS_TOPIC, ExtensionInfo, LoopState,
    dispatch_events,
};
pub use self::driver::run_extension;
pub use self::error::{ExtensionError, ProtocolError};
pub use self::registry::HandlerRegistry;
pub use self::transport::{CONNECTION_TIMEOUT, HostConnection, connect};
pub use mimsy_config::Config;
