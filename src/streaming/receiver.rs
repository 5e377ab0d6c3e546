//! Background receive loop
//!
//! Pulls frames off the inbound stream until shutdown or the first fatal
//! read error, and dispatches them by tag:
//!
//! | Tag                          | Action                                      |
//! |------------------------------|---------------------------------------------|
//! | Video / VideoLeft / VideoRight | ack on the same stream, then publish copy |
//! | Ack                          | ignored                                     |
//! | Control                      | not expected inbound; logged, discarded     |
//! | anything else                | logged, discarded (payload already consumed) |
//!
//! # Ack ordering
//!
//! The server sends the next frame only after it sees an ack, so the ack goes
//! out before the payload is copied or published. Reordering these adds the
//! copy time to every frame's round trip.
//!
//! # Termination
//!
//! The running flag is checked between complete frames, never mid-read. A
//! read blocked on a silent peer is released by closing the socket from the
//! session side. Whatever ends the loop, the registered sockets are closed
//! before the thread exits. There is no reconnect.

use super::stats::LinkStats;
use crate::core::types::Eye;
use crate::error::{Error, Result};
use crate::mailbox::FrameSlots;
use crate::protocol::message::{ACK_PAYLOAD, TAG_ACK, TagSpace, TypeTag};
use crate::protocol::reader::{Frame, FrameReader};
use crate::transport::{Closer, FrameWriter};
use std::io::{Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

/// Log a throughput line every this many video frames
const STATS_LOG_INTERVAL: u64 = 100;

/// Receive loop settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverConfig {
    /// How video tags map to eyes
    pub tags: TagSpace,
    /// Send an ack for every video frame
    pub acknowledge: bool,
    /// Largest accepted payload, 0 for unlimited
    pub max_payload: usize,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            tags: TagSpace::Combined,
            acknowledge: true,
            max_payload: 0,
        }
    }
}

/// What a single frame was dispatched as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Video(Eye),
    Ack,
    Control,
    Unknown(u8),
}

/// Everything the loop touches besides the reader
struct Dispatcher<W> {
    acks: FrameWriter<W>,
    frames: Arc<FrameSlots>,
    stats: Arc<LinkStats>,
    config: ReceiverConfig,
}

impl<W: Write> Dispatcher<W> {
    fn handle(&self, frame: Frame<'_>) -> Result<Dispatch> {
        let eye = match frame.type_tag(self.config.tags) {
            TypeTag::Video => Eye::Combined,
            TypeTag::VideoLeft => Eye::Left,
            TypeTag::VideoRight => Eye::Right,
            TypeTag::Ack => {
                log::trace!("Ack received (ignored)");
                return Ok(Dispatch::Ack);
            }
            TypeTag::Control => {
                log::warn!(
                    "Unexpected inbound control frame ({} bytes), discarded",
                    frame.length()
                );
                return Ok(Dispatch::Control);
            }
            TypeTag::Unknown(tag) => {
                self.stats.record_unknown();
                log::warn!(
                    "Unknown message tag 0x{:02X} ({} bytes), discarded",
                    tag,
                    frame.length()
                );
                return Ok(Dispatch::Unknown(tag));
            }
        };

        if self.config.acknowledge {
            self.acks.send(TAG_ACK, ACK_PAYLOAD)?;
            self.stats.record_ack();
        }

        let dropped = self.frames.publish(eye, frame.to_vec());
        let count = self.stats.record_video(frame.length(), dropped);
        log::debug!("Received {} video frame ({} bytes)", eye, frame.length());
        if count % STATS_LOG_INTERVAL == 0 {
            let snap = self.stats.snapshot();
            log::debug!(
                "Received {} video frames, {} dropped, {} bytes",
                snap.video_frames,
                snap.frames_dropped,
                snap.video_bytes
            );
        }
        Ok(Dispatch::Video(eye))
    }
}

/// Receive loop bound to one inbound stream
pub struct Receiver<R, W> {
    inbound: R,
    reader: FrameReader,
    dispatcher: Dispatcher<W>,
    running: Arc<AtomicBool>,
    closers: Vec<Arc<dyn Closer>>,
}

impl<R: Read, W: Write> Receiver<R, W> {
    /// Create a receive loop.
    ///
    /// # Arguments
    /// - `inbound`: stream frames are read from
    /// - `acks`: writer for the same socket, shared with any other sender on it
    /// - `frames`: mailbox the newest payloads are published to
    /// - `running`: cleared by the session to request shutdown
    /// - `stats`: shared counters
    pub fn new(
        inbound: R,
        acks: FrameWriter<W>,
        frames: Arc<FrameSlots>,
        running: Arc<AtomicBool>,
        stats: Arc<LinkStats>,
        config: ReceiverConfig,
    ) -> Self {
        Self {
            inbound,
            reader: FrameReader::with_limit(config.max_payload),
            dispatcher: Dispatcher {
                acks,
                frames,
                stats,
                config,
            },
            running,
            closers: Vec::new(),
        }
    }

    /// Register a socket to close when the loop exits
    pub fn close_on_exit(mut self, closer: Arc<dyn Closer>) -> Self {
        self.closers.push(closer);
        self
    }

    /// Read and dispatch exactly one frame
    pub fn receive_one(&mut self) -> Result<Dispatch> {
        let frame = self.reader.read_frame(&mut self.inbound)?;
        self.dispatcher.handle(frame)
    }

    /// Run until the running flag clears or a read fails.
    ///
    /// Errors caused by a requested shutdown (socket closed under a blocked
    /// read) are reported as `Ok`.
    pub fn run(mut self) -> Result<()> {
        log::info!(
            "Receive loop started ({:?} tags, acks {})",
            self.dispatcher.config.tags,
            if self.dispatcher.config.acknowledge { "on" } else { "off" }
        );

        let mut result = Ok(());
        while self.running.load(Ordering::SeqCst) {
            if let Err(e) = self.receive_one() {
                result = Err(e);
                break;
            }
        }

        for closer in &self.closers {
            closer.close();
        }

        let shutdown_requested = !self.running.load(Ordering::SeqCst);
        let snap = self.dispatcher.stats.snapshot();
        match result {
            Ok(()) => {
                log::info!("Receive loop stopped ({} video frames)", snap.video_frames);
                Ok(())
            }
            Err(e) if shutdown_requested => {
                log::info!("Receive loop interrupted by shutdown: {}", e);
                Ok(())
            }
            Err(e) if e.is_disconnect() => {
                log::error!(
                    "Server closed the video stream after {} video frames: {}",
                    snap.video_frames,
                    e
                );
                Err(e)
            }
            Err(e) => {
                log::error!(
                    "Receive loop ended after {} video frames: {}",
                    snap.video_frames,
                    e
                );
                Err(e)
            }
        }
    }
}

impl<R, W> Receiver<R, W>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    /// Run the loop on a named background thread
    pub fn spawn(self) -> Result<JoinHandle<Result<()>>> {
        thread::Builder::new()
            .name("video-receiver".to_string())
            .spawn(move || self.run())
            .map_err(|e| Error::Other(format!("Failed to spawn receive thread: {}", e)))
    }
}
