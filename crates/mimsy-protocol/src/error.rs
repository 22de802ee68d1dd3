//! Errors raised while moving messages across the wire.
//!
//! I/O errors are wrapped in `Arc` so the enum stays cheap to clone into
//! diagnostics and satisfies the `result_large_err` lint.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Failures in the frame or JSON layers of the protocol.
#[derive(Debug, Clone, Error)]
pub enum WireError {
    /// Reading from or writing to the underlying stream failed, including a
    /// peer that closed the stream part-way through a frame.
    #[error("stream {operation} failed: {source}")]
    Io {
        /// `"read"` or `"write"`.
        operation: &'static str,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// A frame's payload length exceeds what the frame or reader accepts.
    #[error("frame payload of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge {
        /// Declared or actual payload length.
        len: u64,
        /// Largest accepted payload length.
        max: u64,
    },

    /// A buffer ended before the declared payload length was reached.
    #[error("frame declares {declared} payload bytes but only {available} are present")]
    TruncatedFrame {
        /// Length from the prefix.
        declared: usize,
        /// Bytes actually present after the prefix.
        available: usize,
    },

    /// A buffer held more bytes than the declared payload length.
    #[error("frame declares {declared} payload bytes but {available} follow the prefix")]
    TrailingBytes {
        /// Length from the prefix.
        declared: usize,
        /// Bytes actually present after the prefix.
        available: usize,
    },

    /// A message could not be serialised to JSON.
    #[error("failed to serialise message: {0}")]
    Serialize(#[source] Arc<serde_json::Error>),

    /// A payload was not valid JSON for the expected message shape.
    #[error("failed to deserialise message: {source}")]
    Deserialize {
        /// Underlying JSON error.
        #[source]
        source: Arc<serde_json::Error>,
    },
}

impl WireError {
    pub(crate) fn read(source: io::Error) -> Self {
        Self::Io {
            operation: "read",
            source: Arc::new(source),
        }
    }

    pub(crate) fn write(source: io::Error) -> Self {
        Self::Io {
            operation: "write",
            source: Arc::new(source),
        }
    }

    /// Returns `true` when the failure came from the stream rather than from
    /// the bytes on it.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
