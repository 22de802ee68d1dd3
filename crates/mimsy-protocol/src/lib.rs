//! Wire protocol spoken between the Mimsy editor and its extensions.
//!
//! The host editor listens on a private socket and every extension process
//! connects to it. Both directions carry frames: a 4-byte big-endian length
//! followed by a UTF-8 JSON object whose `Method` key names the message.
//!
//! The crate is split into layers:
//!
//! - [`frame`] reads and writes length-prefixed frames, retrying partial reads
//!   until a frame is complete.
//! - [`message`] models the JSON objects as [`Message`].
//! - [`codec`] joins the two for single buffers.
//! - [`MessageStream`] joins them for a live duplex stream.
//!
//! The session rules (handshake, one outstanding notification at a time) live
//! in `mimsy-extension`; this crate only knows about bytes and shapes.

pub mod codec;
pub mod error;
pub mod frame;
pub mod message;
pub mod stream;

#[cfg(test)]
mod tests;

pub use self::codec::{decode_message, decode_payload, encode_message, encode_payload};
pub use self::error::WireError;
pub use self::frame::{LENGTH_PREFIX_LEN, decode_frame, encode_frame, read_frame, write_frame};
pub use self::message::{Message, method};
pub use self::stream::MessageStream;
