//! Errors that end an extension's session with the host.
//!
//! Every variant is terminal: the dispatch loop never retries or reconnects.
//! The variants only differ in what the operator is told.

use std::io;
use std::sync::Arc;

use mimsy_protocol::WireError;
use thiserror::Error;

/// Failure that closed the connection to the host.
#[derive(Debug, Clone, Error)]
pub enum ExtensionError {
    /// The socket to the host could not be established.
    #[error("failed to connect to host at {endpoint}: {source}")]
    Connection {
        /// Endpoint that was dialled.
        endpoint: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// Reading or writing the socket failed, or the host closed it.
    #[error("I/O error talking to host: {0}")]
    Io(#[source] WireError),

    /// A frame or its JSON payload did not match the protocol.
    #[error("malformed protocol message: {0}")]
    Codec(#[source] WireError),

    /// The host broke the session rules, or the extension misused the API.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ExtensionError {
    /// Short category name used in structured logs.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connection",
            Self::Io(_) => "io",
            Self::Codec(_) => "codec",
            Self::Protocol(_) => "protocol",
        }
    }
}

impl From<WireError> for ExtensionError {
    fn from(error: WireError) -> Self {
        if error.is_io() {
            Self::Io(error)
        } else {
            Self::Codec(error)
        }
    }
}

/// Violations of the session rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The first message on the connection was not the registration prompt.
    #[error("expected 'on_register' as the first message but received '{method}'")]
    UnexpectedHandshake {
        /// Method that arrived instead.
        method: String,
    },

    /// The host sent a notification nobody registered a handler for.
    #[error("host sent notification '{method}' but no handler is registered for it")]
    UnknownMethod {
        /// Method that could not be resolved.
        method: String,
    },

    /// A handler was registered for a fixed protocol method.
    #[error("'{method}' is a fixed protocol method and cannot have a handler")]
    ReservedMethod {
        /// Method that was rejected.
        method: String,
    },

    /// A dispatch loop operation was called in the wrong session state.
    #[error("'{operation}' cannot be called while the dispatch loop is {state}")]
    OutOfOrder {
        /// Operation that was attempted.
        operation: &'static str,
        /// State the loop was in.
        state: &'static str,
    },

    /// The dispatch loop was used after it had already closed.
    #[error("the dispatch loop has already closed")]
    Closed,
}
