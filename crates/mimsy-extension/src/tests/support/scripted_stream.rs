//! In-memory stand-in for the host side of a connection.
//!
//! The script is a queue of host frames. A frame is only released once the
//! extension has answered the previous one with a reply or acknowledgment;
//! reading earlier is recorded as [`Event::PrematureRead`] and fails. Reads
//! can be split into small chunks to exercise partial-read handling. Every
//! delivery and every frame the extension writes lands on a shared
//! [`Timeline`] that handlers can also write to.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Cursor, Read, Write};
use std::rc::Rc;

use mimsy_protocol::{Message, MessageStream, encode_message};

/// One observable step of a scripted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    /// The host began delivering a frame with this method.
    Delivered(String),
    /// A handler ran.
    Handled(&'static str),
    /// The extension wrote a frame.
    Sent(Message),
    /// The extension read while the host still awaited an answer.
    PrematureRead,
}

/// Shared, ordered record of a session.
#[derive(Debug, Clone, Default)]
pub(crate) struct Timeline {
    events: Rc<RefCell<Vec<Event>>>,
}

impl Timeline {
    pub(crate) fn record(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Frames written by the extension, in order.
    pub(crate) fn sent(&self) -> Vec<Message> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Sent(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug)]
pub(crate) struct ScriptedStream {
    script: VecDeque<(String, Vec<u8>)>,
    current: Cursor<Vec<u8>>,
    chunk: usize,
    awaiting_answer: bool,
    outgoing: Vec<u8>,
    frames_sent: usize,
    write_limit: Option<usize>,
    timeline: Timeline,
}

impl ScriptedStream {
    pub(crate) fn new(timeline: Timeline) -> Self {
        Self {
            script: VecDeque::new(),
            current: Cursor::new(Vec::new()),
            chunk: usize::MAX,
            awaiting_answer: false,
            outgoing: Vec::new(),
            frames_sent: 0,
            write_limit: None,
            timeline,
        }
    }

    /// Queues a host frame.
    pub(crate) fn deliver(mut self, message: &Message) -> Self {
        let frame = encode_message(message).expect("encode scripted frame");
        self.script.push_back((message.method().to_owned(), frame));
        self
    }

    /// Queues raw bytes as one host frame.
    pub(crate) fn deliver_raw(mut self, label: &str, bytes: Vec<u8>) -> Self {
        self.script.push_back((label.to_owned(), bytes));
        self
    }

    /// Hands out at most `chunk` bytes per read.
    pub(crate) fn chunked(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    /// Fails every write once `frames` frames have been written.
    pub(crate) fn fail_writes_after(mut self, frames: usize) -> Self {
        self.write_limit = Some(frames);
        self
    }

    fn current_exhausted(&self) -> bool {
        let len = u64::try_from(self.current.get_ref().len()).expect("frame length fits u64");
        self.current.position() >= len
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.current_exhausted() {
            if self.awaiting_answer {
                self.timeline.record(Event::PrematureRead);
                return Err(io::Error::other("read issued while the host awaits an answer"));
            }
            let Some((label, frame)) = self.script.pop_front() else {
                return Ok(0);
            };
            self.timeline.record(Event::Delivered(label));
            self.current = Cursor::new(frame);
            self.awaiting_answer = true;
        }
        let limit = buf.len().min(self.chunk);
        let target = buf.get_mut(..limit).expect("limit within buffer");
        self.current.read(target)
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.write_limit.is_some_and(|limit| self.frames_sent >= limit) {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        self.outgoing.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let bytes = std::mem::take(&mut self.outgoing);
        let mut frames = MessageStream::new(Cursor::new(bytes), u32::MAX);
        while let Ok(message) = frames.receive() {
            if !matches!(message, Message::LogMessage { .. }) {
                self.awaiting_answer = false;
            }
            self.timeline.record(Event::Sent(message));
            self.frames_sent += 1;
        }
        Ok(())
    }
}
