//! Log lines sent to the host editor.
//!
//! [`HostLogger::log`] never blocks and never fails: the line is queued and
//! the dispatch loop writes queued lines to the host as `log` frames at points
//! where the host is known to be waiting on the extension. That keeps log
//! frames from landing between a reply and the next notification, where the
//! host does not expect them.
//!
//! Handlers usually capture a clone of the logger:
//!
//! ```
//! use mimsy_extension::{HandlerRegistry, HostLogger};
//!
//! let logger = HostLogger::new();
//! let mut registry = HandlerRegistry::new();
//! let handler_logger = logger.clone();
//! registry
//!     .register("on_save", move || handler_logger.log("MyExtension", "saved"))
//!     .unwrap();
//! registry.resolve("on_save").unwrap()();
//! assert_eq!(logger.pending(), 1);
//! ```

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mimsy_protocol::{Message, MessageStream, WireError};
use tracing::debug;

const DIAGNOSTICS_TARGET: &str = "mimsy_extension::diagnostics";

/// Fire-and-forget client for the host's log.
///
/// Clones share one queue.
#[derive(Debug, Clone, Default)]
pub struct HostLogger {
    queue: Arc<Mutex<VecDeque<Message>>>,
}

impl HostLogger {
    /// Creates a logger with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `text` under `topic` for the host's log.
    pub fn log(&self, topic: &str, text: impl Into<String>) {
        let line = text.into();
        debug!(target: DIAGNOSTICS_TARGET, topic, text = line.as_str(), "queued host log");
        self.lock().push_back(Message::log(topic, line));
    }

    /// Number of lines waiting to be sent.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Sends every queued line, oldest first, and returns how many were sent.
    ///
    /// A line that fails to send stays at the head of the queue.
    pub(crate) fn flush<S: Write>(&self, stream: &mut MessageStream<S>) -> Result<usize, WireError> {
        let mut sent = 0;
        loop {
            // Release the lock before writing so handlers on other threads
            // can keep queueing.
            let Some(message) = self.lock().front().cloned() else {
                break;
            };
            stream.send(&message)?;
            self.lock().pop_front();
            sent += 1;
        }
        Ok(sent)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Message>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Queues a formatted line on a [`HostLogger`].
///
/// ```
/// use mimsy_extension::{HostLogger, host_log};
///
/// let logger = HostLogger::new();
/// host_log!(logger, "MyExtension", "opened {} files", 3);
/// assert_eq!(logger.pending(), 1);
/// ```
#[macro_export]
macro_rules! host_log {
    ($logger:expr, $topic:expr, $($arg:tt)+) => {
        $logger.log($topic, ::std::format!($($arg)+))
    };
}
