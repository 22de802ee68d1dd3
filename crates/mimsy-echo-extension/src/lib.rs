//! A minimal Mimsy extension that reports every editor event it sees.
//!
//! Each handled notification is echoed to the host's log under
//! [`ECHO_TOPIC`], which makes the extension useful for checking that a host
//! delivers events and waits for their acknowledgments.

use mimsy_extension::{ExtensionInfo, HandlerRegistry, HostLogger, ProtocolError};

/// Host log topic for echoed events.
pub const ECHO_TOPIC: &str = "EchoExtension";

/// Notifications the extension subscribes to.
pub const ECHOED_METHODS: [&str; 3] = ["on_load", "on_save", "on_selection_changed"];

/// Identity reported to the host.
#[must_use]
pub fn identity() -> ExtensionInfo {
    ExtensionInfo::new(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        "https://github.com/jesse99/mimsy",
    )
}

/// Registers one echoing handler per entry of [`ECHOED_METHODS`].
///
/// # Errors
///
/// Returns the registry's error if a method is reserved.
pub fn build_registry(logger: &HostLogger) -> Result<HandlerRegistry<'static>, ProtocolError> {
    let mut registry = HandlerRegistry::new();
    for method in ECHOED_METHODS {
        let handler_logger = logger.clone();
        let mut seen = 0_u64;
        registry.register(method, move || {
            seen += 1;
            handler_logger.log(ECHO_TOPIC, format!("{method} #{seen}"));
        })?;
    }
    Ok(registry)
}
