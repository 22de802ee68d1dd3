//! Test doubles for the host side of a session.

mod fake_host;
mod scripted_stream;

pub(crate) use fake_host::FakeHost;
pub(crate) use scripted_stream::{Event, ScriptedStream, Timeline};
