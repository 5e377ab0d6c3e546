//! Reliable frame reader
//!
//! Stream sockets deliver data in arbitrary chunks, so every field is read
//! with a loop-until-complete discipline. A frame is either returned whole or
//! the read fails; a partially filled frame is never handed out.
//!
//! The payload lands in a scratch buffer that grows to the largest frame seen
//! and is reused across calls. [`Frame`] borrows that buffer, so anything that
//! outlives the next read must be copied out with [`Frame::to_message`] or
//! [`Frame::to_vec`].

use super::header::{LENGTH_LEN, decode_length};
use super::message::{Message, TagSpace, TypeTag};
use crate::error::{Error, ReadStage, Result};
use std::io::{ErrorKind, Read};

/// Initial scratch capacity (a small JPEG)
const INITIAL_BUFFER_CAPACITY: usize = 64 * 1024;

/// A frame borrowed from the reader's scratch buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub tag: u8,
    pub payload: &'a [u8],
}

impl Frame<'_> {
    #[inline]
    pub fn length(&self) -> usize {
        self.payload.len()
    }

    pub fn type_tag(&self, space: TagSpace) -> TypeTag {
        TypeTag::from_wire(self.tag, space)
    }

    /// Independent copy of the payload
    pub fn to_vec(&self) -> Vec<u8> {
        self.payload.to_vec()
    }

    /// Independent owned message
    pub fn to_message(&self) -> Message {
        Message::new(self.tag, self.to_vec())
    }
}

/// Reads one complete tagged message at a time from a byte stream
pub struct FrameReader {
    buffer: Vec<u8>,
    max_payload: Option<usize>,
}

impl FrameReader {
    /// Reader without a payload size limit
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_payload: None,
        }
    }

    /// Reader that rejects frames declaring more than `limit` payload bytes.
    ///
    /// A limit of 0 means unlimited.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            max_payload: (limit > 0).then_some(limit),
            ..Self::new()
        }
    }

    /// Current scratch buffer size (largest payload seen so far)
    pub fn scratch_len(&self) -> usize {
        self.buffer.len()
    }

    /// Read exactly one frame.
    ///
    /// # Errors
    /// - [`Error::ConnectionClosed`] if the stream ends before the tag byte
    /// - [`Error::StreamTruncated`] if it ends (or errors) inside a frame
    /// - [`Error::FrameTooLarge`] if the declared length exceeds the limit
    /// - [`Error::Io`] if reading the tag byte fails
    pub fn read_frame<R: Read + ?Sized>(&mut self, stream: &mut R) -> Result<Frame<'_>> {
        let tag = read_tag(stream)?;

        let mut len_buf = [0u8; LENGTH_LEN];
        read_full(stream, &mut len_buf, ReadStage::Length)?;
        let len = decode_length(len_buf) as usize;

        if let Some(limit) = self.max_payload
            && len > limit
        {
            return Err(Error::FrameTooLarge { length: len, limit });
        }

        // Grow only; never shrink so the largest frame size is remembered
        if self.buffer.len() < len {
            self.buffer.resize(len, 0);
        }
        read_full(stream, &mut self.buffer[..len], ReadStage::Payload)?;

        log::trace!("Frame read: tag=0x{:02X}, len={}", tag, len);
        Ok(Frame {
            tag,
            payload: &self.buffer[..len],
        })
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Read one frame into a freshly allocated message
pub fn read_message<R: Read + ?Sized>(stream: &mut R) -> Result<Message> {
    let mut reader = FrameReader::new();
    let frame = reader.read_frame(stream)?;
    Ok(frame.to_message())
}

fn read_tag<R: Read + ?Sized>(stream: &mut R) -> Result<u8> {
    let mut tag = [0u8; 1];
    loop {
        match stream.read(&mut tag) {
            Ok(0) => return Err(Error::ConnectionClosed),
            Ok(_) => return Ok(tag[0]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
}

fn read_full<R: Read + ?Sized>(stream: &mut R, buf: &mut [u8], stage: ReadStage) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(Error::StreamTruncated {
                    stage,
                    expected: buf.len(),
                    received: filled,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                log::debug!("Read error mid-{}: {}", stage, e);
                return Err(Error::StreamTruncated {
                    stage,
                    expected: buf.len(),
                    received: filled,
                });
            }
        }
    }
    Ok(())
}
