//! A framed, JSON-encoded message channel over any duplex byte stream.

use std::io::{Read, Write};

use tracing::debug;

use crate::codec::{decode_payload, encode_payload};
use crate::error::WireError;
use crate::frame::{read_frame, write_frame};
use crate::message::Message;

/// Tracing target for message-level I/O.
const STREAM_TARGET: &str = "mimsy_protocol::stream";

/// Sends and receives whole [`Message`] values over a byte stream.
///
/// The stream is owned; [`MessageStream::into_inner`] hands it back.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use mimsy_protocol::{Message, MessageStream};
///
/// let mut stream = MessageStream::new(Cursor::new(Vec::new()), 1024);
/// stream.send(&Message::CompletionAck).unwrap();
/// let bytes = stream.into_inner().into_inner();
/// assert_eq!(&bytes[..4], &[0, 0, 0, 35]);
/// ```
#[derive(Debug)]
pub struct MessageStream<S> {
    inner: S,
    max_frame_len: u32,
}

impl<S> MessageStream<S> {
    /// Wraps `inner`, rejecting incoming frames larger than `max_frame_len`.
    #[must_use]
    pub const fn new(inner: S, max_frame_len: u32) -> Self {
        Self {
            inner,
            max_frame_len,
        }
    }

    /// Largest accepted incoming payload.
    #[must_use]
    pub const fn max_frame_len(&self) -> u32 {
        self.max_frame_len
    }

    /// Borrows the underlying stream.
    #[must_use]
    pub const fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrows the underlying stream.
    #[must_use]
    pub const fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Returns the underlying stream.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Read> MessageStream<S> {
    /// Blocks until one complete message has been read.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Io`] on stream failure or closure, and a codec
    /// variant when the frame or its JSON is malformed.
    pub fn receive(&mut self) -> Result<Message, WireError> {
        let payload = read_frame(&mut self.inner, self.max_frame_len)?;
        let message = decode_payload(&payload)?;
        debug!(
            target: STREAM_TARGET,
            method = message.method(),
            frame_bytes = payload.len(),
            "received message"
        );
        Ok(message)
    }
}

impl<S: Write> MessageStream<S> {
    /// Writes one message as a frame and flushes it.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Serialize`] if the message cannot be encoded and
    /// [`WireError::Io`] if the stream rejects the write.
    pub fn send(&mut self, message: &Message) -> Result<(), WireError> {
        let payload = encode_payload(message)?;
        write_frame(&mut self.inner, &payload)?;
        debug!(
            target: STREAM_TARGET,
            method = message.method(),
            frame_bytes = payload.len(),
            "sent message"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::encode_message;
    use crate::tests::ChunkedReader;

    #[test]
    fn receive_decodes_split_frames() {
        let frame = encode_message(&Message::notification("on_save")).expect("encode");
        let mut stream = MessageStream::new(ChunkedReader::new(frame, 2), 1024);
        assert_eq!(
            stream.receive().expect("receive"),
            Message::notification("on_save")
        );
    }

    #[test]
    fn send_writes_a_decodable_frame() {
        let mut stream = MessageStream::new(Cursor::new(Vec::new()), 1024);
        stream
            .send(&Message::log("Extensions", "hello"))
            .expect("send");

        let bytes = stream.into_inner().into_inner();
        assert_eq!(
            crate::codec::decode_message(&bytes).expect("decode"),
            Message::log("Extensions", "hello")
        );
    }

    #[test]
    fn receive_respects_the_frame_limit() {
        let frame = encode_message(&Message::notification("on_save")).expect("encode");
        let mut stream = MessageStream::new(Cursor::new(frame), 4);
        let error = stream.receive().expect_err("frame exceeds limit");
        assert!(matches!(error, WireError::FrameTooLarge { max: 4, .. }));
    }

    #[test]
    fn receive_reports_closed_stream_as_io() {
        let mut stream = MessageStream::new(Cursor::new(Vec::new()), 1024);
        assert!(stream.receive().expect_err("empty stream").is_io());
    }
}
