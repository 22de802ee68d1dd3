//! The session state machine.
//!
//! A [`DispatchLoop`] owns the connection to the host for the life of the
//! process. It answers the registration prompt with the extension's identity,
//! then handles one notification at a time: read it, run its handler, and
//! acknowledge it before reading anything else. The host only listens for
//! extension frames while one of its own frames is outstanding, so queued
//! [`HostLogger`] lines are written inside those windows and nowhere else.
//!
//! Every failure is terminal. The loop moves to [`LoopState::Closed`] and
//! reports the error; it never skips a frame or reconnects.

use std::convert::Infallible;
use std::fmt;
use std::io::{Read, Write};

use mimsy_config::{Config, DEFAULT_MAX_FRAME_LEN};
use mimsy_protocol::{Message, MessageStream};
use tracing::{debug, error, info};

use crate::diagnostics::HostLogger;
use crate::error::{ExtensionError, ProtocolError};
use crate::registry::HandlerRegistry;
use crate::transport::connect;

const DISPATCH_TARGET: &str = "mimsy_extension::dispatch";

/// Host log topic for notification receipts.
pub const EXTENSIONS_TOPIC: &str = "Extensions";
/// Host log topic for fatal session errors.
pub const ERROR_TOPIC: &str = "Error";

/// Where the dispatch loop is in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoopState {
    /// The connection to the host is being opened.
    #[default]
    Connecting,
    /// Connected; waiting for the `on_register` prompt.
    AwaitingRegisterPrompt,
    /// Collecting the identity and sending the registration reply.
    Registering,
    /// Waiting for the next notification.
    Idle,
    /// A notification's handler is running.
    Dispatching,
    /// The handler has returned; queued logs and the acknowledgment are
    /// being written.
    AwaitingCompletionFlush,
    /// The session has ended. Terminal.
    Closed,
}

impl LoopState {
    /// Lower-case name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::AwaitingRegisterPrompt => "awaiting_register_prompt",
            Self::Registering => "registering",
            Self::Idle => "idle",
            Self::Dispatching => "dispatching",
            Self::AwaitingCompletionFlush => "awaiting_completion_flush",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol knobs for a [`DispatchLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    acknowledge_registration: bool,
    max_frame_len: u32,
}

impl DispatchOptions {
    /// Sends `notification_completed` after the registration reply when set.
    #[must_use]
    pub const fn with_acknowledge_registration(mut self, acknowledge: bool) -> Self {
        self.acknowledge_registration = acknowledge;
        self
    }

    /// Rejects incoming frames with a payload above `max_frame_len` bytes.
    #[must_use]
    pub const fn with_max_frame_len(mut self, max_frame_len: u32) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Whether the registration reply is acknowledged.
    #[must_use]
    pub const fn acknowledge_registration(&self) -> bool {
        self.acknowledge_registration
    }

    /// Largest accepted incoming payload.
    #[must_use]
    pub const fn max_frame_len(&self) -> u32 {
        self.max_frame_len
    }
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            acknowledge_registration: false,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl From<&Config> for DispatchOptions {
    fn from(config: &Config) -> Self {
        Self {
            acknowledge_registration: config.acknowledge_registration(),
            max_frame_len: config.max_frame_len(),
        }
    }
}

/// Identity sent to the host in the registration reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionInfo {
    name: String,
    version: String,
    url: String,
}

impl ExtensionInfo {
    /// Builds an identity from its three parts.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            url: url.into(),
        }
    }

    /// Extension name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Extension version.
    #[must_use]
    pub const fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Extension home page.
    #[must_use]
    pub const fn url(&self) -> &str {
        self.url.as_str()
    }

    fn to_reply(&self) -> Message {
        Message::register_reply(self.name.as_str(), self.version.as_str(), self.url.as_str())
    }
}

/// Drives one session with the host over `S`.
#[derive(Debug)]
pub struct DispatchLoop<'h, S> {
    stream: MessageStream<S>,
    registry: HandlerRegistry<'h>,
    logger: HostLogger,
    options: DispatchOptions,
    state: LoopState,
    info: Option<ExtensionInfo>,
}

impl<'h, S: Read + Write> DispatchLoop<'h, S> {
    /// Creates a loop over an established connection with default options.
    #[must_use]
    pub fn new(stream: S, registry: HandlerRegistry<'h>, logger: HostLogger) -> Self {
        Self::with_options(stream, registry, logger, DispatchOptions::default())
    }

    /// Creates a loop over an established connection.
    #[must_use]
    pub fn with_options(
        stream: S,
        registry: HandlerRegistry<'h>,
        logger: HostLogger,
        options: DispatchOptions,
    ) -> Self {
        Self {
            stream: MessageStream::new(stream, options.max_frame_len()),
            registry,
            logger,
            options,
            state: LoopState::AwaitingRegisterPrompt,
            info: None,
        }
    }

    /// Current session state.
    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Identity sent during the handshake, once it has been sent.
    #[must_use]
    pub const fn extension_info(&self) -> Option<&ExtensionInfo> {
        self.info.as_ref()
    }

    /// Returns the underlying stream.
    #[must_use]
    pub fn into_stream(self) -> S {
        self.stream.into_inner()
    }

    /// Answers the host's registration prompt.
    ///
    /// Reads the first frame, which must be `on_register`, calls `loading` for
    /// the extension's identity and sends it as `register_extension`. No
    /// response to the reply is awaited.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnexpectedHandshake`] if the first frame is
    /// anything else, and the underlying error if reading or writing fails.
    /// Calling this twice fails with [`ProtocolError::OutOfOrder`].
    pub fn handshake<L>(&mut self, loading: L) -> Result<(), ExtensionError>
    where
        L: FnOnce() -> ExtensionInfo,
    {
        self.expect_state(LoopState::AwaitingRegisterPrompt, "handshake")?;
        let outcome = self.register(loading);
        self.settle(outcome)
    }

    /// Reads, handles and acknowledges exactly one notification.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownMethod`] without acknowledging when no
    /// handler is registered for the notification, and the underlying error
    /// if reading or writing fails. Calling this before [`Self::handshake`]
    /// fails with [`ProtocolError::OutOfOrder`].
    pub fn dispatch_next(&mut self) -> Result<(), ExtensionError> {
        self.expect_state(LoopState::Idle, "dispatch_next")?;
        let outcome = self.dispatch_one();
        self.settle(outcome)
    }

    /// Performs the handshake and then dispatches notifications until the
    /// session fails. Only ever returns an error.
    ///
    /// # Errors
    ///
    /// Returns the error that closed the session.
    pub fn run<L>(&mut self, loading: L) -> Result<Infallible, ExtensionError>
    where
        L: FnOnce() -> ExtensionInfo,
    {
        self.handshake(loading)?;
        info!(
            target: DISPATCH_TARGET,
            methods = ?self.registry.methods(),
            "registered with host"
        );
        loop {
            self.dispatch_next()?;
        }
    }

    fn register<L>(&mut self, loading: L) -> Result<(), ExtensionError>
    where
        L: FnOnce() -> ExtensionInfo,
    {
        let prompt = self.stream.receive()?;
        if prompt != Message::RegisterPrompt {
            return Err(ProtocolError::UnexpectedHandshake {
                method: prompt.method().to_owned(),
            }
            .into());
        }

        self.transition(LoopState::Registering);
        let identity = loading();
        self.logger.flush(&mut self.stream)?;
        self.stream.send(&identity.to_reply())?;
        if self.options.acknowledge_registration() {
            self.stream.send(&Message::CompletionAck)?;
        }
        self.info = Some(identity);
        self.transition(LoopState::Idle);
        Ok(())
    }

    fn dispatch_one(&mut self) -> Result<(), ExtensionError> {
        let notification = self.stream.receive()?;
        self.transition(LoopState::Dispatching);
        let method_name = notification.method();

        let Some(handler) = self.registry.resolve(method_name) else {
            let extension_name = self.info.as_ref().map_or("extension", ExtensionInfo::name);
            self.logger.log(
                ERROR_TOPIC,
                format!("{extension_name} received a bad method: '{method_name}'"),
            );
            // The unknown method is the failure to report, not the log write.
            if let Err(flush_error) = self.logger.flush(&mut self.stream) {
                debug!(
                    target: DISPATCH_TARGET,
                    error = %flush_error,
                    "could not send bad method report to host"
                );
            }
            return Err(ProtocolError::UnknownMethod {
                method: method_name.to_owned(),
            }
            .into());
        };

        self.logger.log(EXTENSIONS_TOPIC, format!("read {method_name}"));
        self.logger.flush(&mut self.stream)?;
        handler();

        self.transition(LoopState::AwaitingCompletionFlush);
        self.logger.flush(&mut self.stream)?;
        self.stream.send(&Message::CompletionAck)?;
        self.transition(LoopState::Idle);
        Ok(())
    }

    fn expect_state(&self, expected: LoopState, operation: &'static str) -> Result<(), ProtocolError> {
        match self.state {
            state if state == expected => Ok(()),
            LoopState::Closed => Err(ProtocolError::Closed),
            state => Err(ProtocolError::OutOfOrder {
                operation,
                state: state.as_str(),
            }),
        }
    }

    fn settle(&mut self, outcome: Result<(), ExtensionError>) -> Result<(), ExtensionError> {
        if let Err(failure) = &outcome {
            error!(
                target: DISPATCH_TARGET,
                category = failure.category(),
                state = %self.state,
                error = %failure,
                "session with host closed"
            );
            self.state = LoopState::Closed;
        }
        outcome
    }

    fn transition(&mut self, next: LoopState) {
        debug!(target: DISPATCH_TARGET, from = %self.state, to = %next, "state change");
        self.state = next;
    }
}

/// Connects to the configured host and runs a session until it fails.
///
/// The connection is closed before returning.
///
/// # Errors
///
/// Returns [`ExtensionError::Connection`] if the host cannot be reached and
/// otherwise the error that ended the session.
pub fn dispatch_events<L>(
    config: &Config,
    registry: HandlerRegistry<'_>,
    logger: HostLogger,
    loading: L,
) -> Result<Infallible, ExtensionError>
where
    L: FnOnce() -> ExtensionInfo,
{
    debug!(
        target: DISPATCH_TARGET,
        state = %LoopState::Connecting,
        endpoint = %config.host_endpoint(),
        "connecting to host"
    );
    let connection = connect(config.host_endpoint())?;
    let mut session =
        DispatchLoop::with_options(connection, registry, logger, DispatchOptions::from(config));
    let outcome = session.run(loading);
    if let Err(close_error) = session.into_stream().close() {
        debug!(target: DISPATCH_TARGET, error = %close_error, "host connection already closed");
    }
    outcome
}
