//! Serialized frame writer
//!
//! Each message is assembled into one buffer and written under a lock, so
//! frames from different threads (control ticks and acks sharing a socket)
//! never interleave on the wire.

use crate::error::{Error, Result};
use crate::protocol::message::{Message, encode_into};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

struct WriterState<W> {
    stream: W,
    buffer: Vec<u8>,
}

/// Cloneable handle to a send-side locked stream
pub struct FrameWriter<W> {
    inner: Arc<Mutex<WriterState<W>>>,
}

impl<W> Clone for FrameWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: Write> FrameWriter<W> {
    pub fn new(stream: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WriterState {
                stream,
                buffer: Vec::with_capacity(64),
            })),
        }
    }

    /// Write one complete frame.
    ///
    /// # Errors
    /// [`Error::SendFailure`] if the socket write fails
    pub fn send(&self, tag: u8, payload: &[u8]) -> Result<()> {
        let mut guard = self.inner.lock();
        let WriterState { stream, buffer } = &mut *guard;
        buffer.clear();
        encode_into(tag, payload, buffer)?;
        stream.write_all(buffer).map_err(Error::SendFailure)?;
        stream.flush().map_err(Error::SendFailure)
    }

    /// Write an owned message
    pub fn send_message(&self, msg: &Message) -> Result<()> {
        self.send(msg.tag, &msg.payload)
    }

    /// True if both handles point at the same underlying stream
    pub fn same_stream(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::TAG_CONTROL;
    use crate::transport::mock::RecordingWriter;
    use std::thread;

    #[test]
    fn test_send_writes_header_and_payload() {
        let rec = RecordingWriter::new();
        let writer = FrameWriter::new(rec.clone());
        writer.send(TAG_CONTROL, b"1.0,2.0,3.0").unwrap();
        let mut expected = vec![0x01, 0, 0, 0, 11];
        expected.extend_from_slice(b"1.0,2.0,3.0");
        assert_eq!(rec.written(), expected);
        // Header and payload go out in one write
        assert_eq!(rec.write_calls(), 1);
    }

    #[test]
    fn test_clones_share_stream() {
        let writer = FrameWriter::new(RecordingWriter::new());
        let other = FrameWriter::new(RecordingWriter::new());
        assert!(writer.same_stream(&writer.clone()));
        assert!(!writer.same_stream(&other));
    }

    #[test]
    fn test_failure_maps_to_send_failure() {
        let rec = RecordingWriter::new();
        rec.set_fail(true);
        let writer = FrameWriter::new(rec);
        let result = writer.send_message(&Message::ack());
        assert!(matches!(result, Err(Error::SendFailure(_))));
    }

    #[test]
    fn test_concurrent_frames_do_not_interleave() {
        // A writer that accepts at most 3 bytes per call forces write_all to loop
        let rec = RecordingWriter::with_max_write(3);
        let writer = FrameWriter::new(rec.clone());

        let handles: Vec<_> = (0..4u8)
            .map(|t| {
                let w = writer.clone();
                thread::spawn(move || {
                    let payload = vec![t; 50];
                    for _ in 0..25 {
                        w.send(t, &payload).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let msgs = rec.messages().unwrap();
        assert_eq!(msgs.len(), 100);
        for m in msgs {
            assert_eq!(m.payload, vec![m.tag; 50]);
        }
    }
}
