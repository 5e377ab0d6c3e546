//! Link counters shared between the receive thread and the tick

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free traffic counters
#[derive(Debug, Default)]
pub struct LinkStats {
    video_frames: AtomicU64,
    frames_dropped: AtomicU64,
    video_bytes: AtomicU64,
    acks_sent: AtomicU64,
    control_sent: AtomicU64,
    control_failed: AtomicU64,
    unknown_frames: AtomicU64,
}

/// Point-in-time copy of [`LinkStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Video frames fully received
    pub video_frames: u64,
    /// Frames overwritten before the tick took them
    pub frames_dropped: u64,
    /// Payload bytes of received video frames
    pub video_bytes: u64,
    pub acks_sent: u64,
    pub control_sent: u64,
    pub control_failed: u64,
    /// Frames with a tag outside the active tag space
    pub unknown_frames: u64,
}

impl LinkStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the new video frame count
    pub fn record_video(&self, bytes: usize, dropped_previous: bool) -> u64 {
        self.video_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
        if dropped_previous {
            self.frames_dropped.fetch_add(1, Ordering::Relaxed);
        }
        self.video_frames.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_ack(&self) {
        self.acks_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_control(&self, ok: bool) {
        if ok {
            self.control_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.control_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_unknown(&self) {
        self.unknown_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            video_frames: self.video_frames.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            video_bytes: self.video_bytes.load(Ordering::Relaxed),
            acks_sent: self.acks_sent.load(Ordering::Relaxed),
            control_sent: self.control_sent.load(Ordering::Relaxed),
            control_failed: self.control_failed.load(Ordering::Relaxed),
            unknown_frames: self.unknown_frames.load(Ordering::Relaxed),
        }
    }
}
