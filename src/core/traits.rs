//! Collaborator traits implemented by the host application

use super::types::{Eye, EulerAngles};
use crate::error::Result;

/// Head tracking subsystem
pub trait OrientationSource {
    /// Current raw rotation, queried once per tick
    fn current_orientation(&mut self) -> EulerAngles;
}

/// Rendering layer that decodes and displays compressed frames
pub trait FrameSink {
    /// Hand over the newest compressed frame for `eye`.
    ///
    /// Decode failures are reported as errors; the transport logs them and
    /// keeps streaming.
    fn submit_frame(&mut self, eye: Eye, frame: Vec<u8>) -> Result<()>;
}

impl<F> OrientationSource for F
where
    F: FnMut() -> EulerAngles,
{
    fn current_orientation(&mut self) -> EulerAngles {
        self()
    }
}
