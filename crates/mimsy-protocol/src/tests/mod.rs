//! Shared test doubles for the protocol crate.

use std::io::{self, Read};

/// Reader that hands out at most `chunk` bytes per `read` call, simulating a
/// socket that delivers a frame across several low-level reads.
pub(crate) struct ChunkedReader {
    data: Vec<u8>,
    position: usize,
    chunk: usize,
    pub(crate) reads: usize,
}

impl ChunkedReader {
    pub(crate) fn new(data: Vec<u8>, chunk: usize) -> Self {
        Self {
            data,
            position: 0,
            chunk: chunk.max(1),
            reads: 0,
        }
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        let remaining = self.data.get(self.position..).unwrap_or_default();
        let count = remaining.len().min(buf.len()).min(self.chunk);
        let (target, _) = buf.split_at_mut(count);
        let (source, _) = remaining.split_at(count);
        target.copy_from_slice(source);
        self.position += count;
        Ok(count)
    }
}

/// Reader that fails with `Interrupted` before every successful read.
pub(crate) struct InterruptingReader {
    inner: ChunkedReader,
    interrupt_next: bool,
}

impl InterruptingReader {
    pub(crate) fn new(data: Vec<u8>) -> Self {
        Self {
            inner: ChunkedReader::new(data, 3),
            interrupt_next: true,
        }
    }
}

impl Read for InterruptingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.interrupt_next {
            self.interrupt_next = false;
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        self.interrupt_next = true;
        self.inner.read(buf)
    }
}
