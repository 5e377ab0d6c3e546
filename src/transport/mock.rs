//! In-memory test doubles for streams and sockets

use super::Closer;
use crate::error::Result;
use crate::protocol::message::Message;
use crate::protocol::reader::FrameReader;
use parking_lot::Mutex;
use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Reader that hands out at most `chunk` bytes per `read` call, then EOF
pub struct ChunkedReader {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl ChunkedReader {
    pub fn new(data: Vec<u8>, chunk: usize) -> Self {
        Self {
            data,
            pos: 0,
            chunk: chunk.max(1),
        }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.chunk.min(buf.len()).min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

struct RecorderInner {
    bytes: Vec<u8>,
    fail: bool,
    writes: usize,
}

/// Writer that records everything written to it
#[derive(Clone)]
pub struct RecordingWriter {
    inner: Arc<Mutex<RecorderInner>>,
    max_write: usize,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::with_max_write(usize::MAX)
    }

    /// Accept at most `max_write` bytes per `write` call (short writes)
    pub fn with_max_write(max_write: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RecorderInner {
                bytes: Vec::new(),
                fail: false,
                writes: 0,
            })),
            max_write: max_write.max(1),
        }
    }

    /// Make subsequent writes fail with `BrokenPipe`
    pub fn set_fail(&self, fail: bool) {
        self.inner.lock().fail = fail;
    }

    /// All bytes written so far
    pub fn written(&self) -> Vec<u8> {
        self.inner.lock().bytes.clone()
    }

    /// Number of successful `write` calls
    pub fn write_calls(&self) -> usize {
        self.inner.lock().writes
    }

    /// Parse the recorded bytes back into messages
    pub fn messages(&self) -> Result<Vec<Message>> {
        let bytes = self.written();
        let total = bytes.len() as u64;
        let mut cursor = Cursor::new(bytes);
        let mut reader = FrameReader::new();
        let mut out = Vec::new();
        while cursor.position() < total {
            out.push(reader.read_frame(&mut cursor)?.to_message());
        }
        Ok(out)
    }
}

impl Default for RecordingWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for RecordingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock();
        if inner.fail {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock write failure"));
        }
        let n = buf.len().min(self.max_write);
        inner.bytes.extend_from_slice(&buf[..n]);
        inner.writes += 1;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Closer that counts how often it was asked and how often it actually closed
#[derive(Default)]
pub struct CountingCloser {
    calls: AtomicUsize,
    closes: AtomicUsize,
}

impl CountingCloser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Times the resource actually transitioned to closed (0 or 1)
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Closer for CountingCloser {
    fn close(&self) -> bool {
        let first = self.calls.fetch_add(1, Ordering::SeqCst) == 0;
        if first {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
        first
    }
}
