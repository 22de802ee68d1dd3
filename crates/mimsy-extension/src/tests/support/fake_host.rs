//! Loopback host for end-to-end session tests.
//!
//! The host accepts one connection, sends the registration prompt and then
//! each scripted notification, waiting after every frame for the extension's
//! answer. Everything the extension sends is recorded. Once the script is
//! exhausted the host shuts down its sending side and keeps recording until
//! the extension closes the connection.

use std::net::{Shutdown, TcpListener, TcpStream};
use std::thread;

use anyhow::{Context, Result, anyhow};
use mimsy_config::SocketEndpoint;
use mimsy_protocol::{Message, MessageStream};

pub(crate) struct FakeHost {
    port: u16,
    handle: Option<thread::JoinHandle<Result<Vec<Message>>>>,
}

impl FakeHost {
    pub(crate) fn spawn(notifications: Vec<Message>) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake host")?;
        let port = listener.local_addr().context("fake host address")?.port();
        let handle = thread::spawn(move || Self::serve(&listener, notifications));
        Ok(Self {
            port,
            handle: Some(handle),
        })
    }

    pub(crate) fn endpoint(&self) -> SocketEndpoint {
        SocketEndpoint::tcp("127.0.0.1", self.port)
    }

    /// Waits for the session to end and returns every frame the extension
    /// sent.
    pub(crate) fn received(&mut self) -> Result<Vec<Message>> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| anyhow!("fake host already joined"))?;
        handle
            .join()
            .map_err(|_| anyhow!("fake host thread panicked"))?
    }

    fn serve(listener: &TcpListener, notifications: Vec<Message>) -> Result<Vec<Message>> {
        let (stream, _) = listener.accept().context("accept extension")?;
        let mut session = MessageStream::new(stream, u32::MAX);
        let mut received = Vec::new();

        let prompts = std::iter::once(Message::RegisterPrompt).chain(notifications);
        for prompt in prompts {
            session.send(&prompt).context("send host frame")?;
            if !await_answer(&mut session, &mut received) {
                return Ok(received);
            }
        }

        session
            .get_ref()
            .shutdown(Shutdown::Write)
            .context("shut down fake host")?;
        while let Ok(message) = session.receive() {
            received.push(message);
        }
        Ok(received)
    }
}

/// Records frames until a non-log answer arrives. Returns `false` once the
/// extension has hung up.
fn await_answer(session: &mut MessageStream<TcpStream>, received: &mut Vec<Message>) -> bool {
    while let Ok(message) = session.receive() {
        let answered = !matches!(message, Message::LogMessage { .. });
        received.push(message);
        if answered {
            return true;
        }
    }
    false
}
