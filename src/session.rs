//! Streaming session
//!
//! Owns the socket(s), the background receive thread and the frame mailbox.
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──spawn rx──▶ Streaming
//!                               │                      │ tick() per render frame
//!                               ▼ connect failure      │
//!                            (error)                   ▼ shutdown()
//!                                                 ShuttingDown ──▶ Closed
//! ```
//!
//! # Threads
//!
//! - **Foreground** (host): calls [`Session::tick`] once per rendered frame.
//!   Sends one control frame, then drains the mailbox into the sink.
//! - **video-receiver**: blocking read loop, acks and publishes frames.
//!
//! In single-port mode control frames and acks share one socket, so both
//! go through the same [`FrameWriter`] and its lock.
//!
//! # Failure policy
//!
//! Connect failures abort [`Session::connect`]. A receive-loop failure ends
//! the downlink only: ticks keep working (control sends may start failing)
//! and [`Session::is_receiving`] turns false. Reconnecting is up to the host.

use crate::config::{SessionConfig, Topology};
use crate::core::traits::{FrameSink, OrientationSource};
use crate::core::types::{Eye, EulerAngles};
use crate::error::{Error, Result};
use crate::mailbox::{FrameSlots, Mailbox};
use crate::protocol::control::{OrientationMapping, OrientationSample, encode_control};
use crate::streaming::{LinkStats, Receiver, ReceiverConfig, StatsSnapshot};
use crate::transport::{Closer, Connection, FrameWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

/// Log control failures at warn level once every this many
const CONTROL_FAILURE_LOG_INTERVAL: u64 = 100;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Streaming,
    ShuttingDown,
    Closed,
}

/// Outcome of one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Control frame written successfully
    pub control_sent: bool,
    /// Eyes a frame was handed to the sink for, in slot order
    pub frames: Vec<Eye>,
}

/// Client side of the telepresence link
pub struct Session {
    state: SessionState,
    topology: Topology,
    mapping: OrientationMapping,
    control: FrameWriter<TcpStream>,
    /// Socket the receive loop reads from
    inbound: Arc<Connection>,
    /// Separate control socket (dual-port only)
    outbound: Option<Arc<Connection>>,
    frames: Arc<FrameSlots>,
    stats: Arc<LinkStats>,
    running: Arc<AtomicBool>,
    receiver: Option<JoinHandle<Result<()>>>,
    control_failures: u64,
}

/// `host:port`, bracketing bare IPv6 literals
fn socket_addr(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

fn transition(state: &mut SessionState, next: SessionState) {
    log::debug!("Session {:?} -> {:?}", state, next);
    *state = next;
}

impl Session {
    /// Connect to the server and start streaming.
    ///
    /// # Errors
    /// [`Error::ConnectFailure`] if any socket cannot be opened; no thread is
    /// started in that case.
    pub fn connect(topology: &Topology, config: &SessionConfig) -> Result<Self> {
        let mut state = SessionState::Disconnected;
        transition(&mut state, SessionState::Connecting);

        let no_delay = config.no_delay;
        let (inbound, outbound, control, acks) = match topology {
            Topology::Single { host, port } => {
                let link = Arc::new(Connection::open("link", &socket_addr(host, *port), no_delay)?);
                let writer = link.writer()?;
                (link, None, writer.clone(), writer)
            }
            Topology::Dual {
                host,
                control_port,
                video_port,
            } => {
                let video = Arc::new(Connection::open(
                    "video",
                    &socket_addr(host, *video_port),
                    no_delay,
                )?);
                let ctrl = Arc::new(Connection::open(
                    "control",
                    &socket_addr(host, *control_port),
                    no_delay,
                )?);
                let control = ctrl.writer()?;
                let acks = video.writer()?;
                (video, Some(ctrl), control, acks)
            }
        };

        let frames: Arc<FrameSlots> = Arc::new(Mailbox::new());
        let stats = Arc::new(LinkStats::new());
        let running = Arc::new(AtomicBool::new(true));
        let rx_config = ReceiverConfig {
            tags: config.tag_space_for(topology),
            acknowledge: config.acknowledge_frames,
            max_payload: config.max_payload_bytes,
        };

        let receiver = Receiver::new(
            inbound.reader()?,
            acks,
            Arc::clone(&frames),
            Arc::clone(&running),
            Arc::clone(&stats),
            rx_config,
        )
        .close_on_exit(inbound.clone())
        .spawn()?;

        transition(&mut state, SessionState::Streaming);
        log::info!(
            "Session streaming from {} ({:?} tags)",
            inbound.peer_addr(),
            rx_config.tags
        );

        Ok(Self {
            state,
            topology: topology.clone(),
            mapping: OrientationMapping {
                invert_pitch_yaw: config.invert_pitch_yaw,
            },
            control,
            inbound,
            outbound,
            frames,
            stats,
            running,
            receiver: Some(receiver),
            control_failures: 0,
        })
    }

    /// One foreground step: send orientation, then hand pending frames to the sink.
    ///
    /// A failed control send is logged and reported in the [`TickReport`];
    /// the next tick simply tries again.
    ///
    /// # Errors
    /// [`Error::SessionClosed`] once [`Session::shutdown`] has run.
    pub fn tick<S, K>(&mut self, source: &mut S, sink: &mut K) -> Result<TickReport>
    where
        S: OrientationSource + ?Sized,
        K: FrameSink + ?Sized,
    {
        if self.state != SessionState::Streaming {
            return Err(Error::SessionClosed);
        }

        let control_sent = self.send_orientation(source.current_orientation());

        let mut delivered = Vec::new();
        for (eye, frame) in self.frames.take_all() {
            if let Err(e) = sink.submit_frame(eye, frame) {
                log::warn!("Failed to decode {} eye frame: {}", eye, e);
            }
            delivered.push(eye);
        }

        Ok(TickReport {
            control_sent,
            frames: delivered,
        })
    }

    /// Encode and send one control frame. Returns whether the write succeeded.
    fn send_orientation(&mut self, raw: EulerAngles) -> bool {
        let sample = OrientationSample::from_raw_mapped(raw, self.mapping);
        let msg = encode_control(&sample);
        match self.control.send_message(&msg) {
            Ok(()) => {
                if self.control_failures > 0 {
                    log::info!(
                        "Control channel recovered after {} failed sends",
                        self.control_failures
                    );
                    self.control_failures = 0;
                }
                self.stats.record_control(true);
                log::trace!("Control sent: {:?}", sample);
                true
            }
            Err(e) => {
                self.stats.record_control(false);
                self.control_failures += 1;
                if self.control_failures == 1 {
                    log::error!("Control send failed: {}", e);
                } else if self.control_failures % CONTROL_FAILURE_LOG_INTERVAL == 0 {
                    log::warn!(
                        "Control send still failing ({} consecutive): {}",
                        self.control_failures,
                        e
                    );
                } else {
                    log::debug!("Control send failed: {}", e);
                }
                false
            }
        }
    }

    /// Stop the receive thread and close every socket.
    ///
    /// Clears the running flag, closes the inbound socket to release a blocked
    /// read, joins the thread, then closes the control socket. Calling it again
    /// is a no-op.
    pub fn shutdown(&mut self) -> Result<()> {
        if matches!(self.state, SessionState::Closed | SessionState::ShuttingDown) {
            return Ok(());
        }
        transition(&mut self.state, SessionState::ShuttingDown);
        log::info!("Shutting down session...");

        self.running.store(false, Ordering::SeqCst);
        self.inbound.close();

        let joined = match self.receiver.take() {
            Some(handle) => match handle.join() {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    // Already logged by the loop when it ended
                    log::debug!("Receive loop had ended with: {}", e);
                    Ok(())
                }
                Err(_) => Err(Error::ThreadPanic),
            },
            None => Ok(()),
        };

        if let Some(ctrl) = &self.outbound {
            ctrl.close();
        }

        transition(&mut self.state, SessionState::Closed);
        let snap = self.stats.snapshot();
        log::info!(
            "Session closed ({} video frames, {} dropped, {} control sent)",
            snap.video_frames,
            snap.frames_dropped,
            snap.control_sent
        );
        joined
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// True while the receive thread is running
    pub fn is_receiving(&self) -> bool {
        self.receiver
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("Session shutdown failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        assert_eq!(socket_addr("127.0.0.1", 5900), "127.0.0.1:5900");
        assert_eq!(socket_addr("robot.local", 1), "robot.local:1");
        assert_eq!(socket_addr("::1", 60064), "[::1]:60064");
        assert_eq!(socket_addr("[::1]", 60064), "[::1]:60064");
    }

    #[test]
    fn test_connect_failure_never_streams() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let result = Session::connect(
            &Topology::single("127.0.0.1", port),
            &SessionConfig::default(),
        );
        assert!(matches!(result, Err(Error::ConnectFailure { .. })));
    }
}
