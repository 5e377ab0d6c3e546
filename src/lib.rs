//! stereo-link - client transport for a stereo video telepresence link
//!
//! Uploads head orientation to a remote server every tick and downloads
//! compressed video frames, handing the newest one per eye to a renderer.
//!
//! ## Wire format
//!
//! Every message on every socket is `type (1B) | length (4B BE) | payload`.
//!
//! ## Topologies
//!
//! - **Dual-port**: control socket (orientation out), video socket (frames in,
//!   acks out)
//! - **Single-port**: one socket multiplexing control, acks and per-eye video

pub mod config;
pub mod core;
pub mod error;
pub mod host;
pub mod mailbox;
pub mod protocol;
pub mod session;
pub mod streaming;
pub mod transport;

// Re-export commonly used types
pub use config::{AppConfig, SessionConfig, Topology};
pub use core::traits::{FrameSink, OrientationSource};
pub use core::types::{Eye, EulerAngles};
pub use error::{Error, Result};
pub use mailbox::{FrameSlots, Mailbox};
pub use session::{Session, SessionState, TickReport};
pub use streaming::StatsSnapshot;
