//! Bundled host: a fixed orientation source, a logging frame sink and the
//! tick loop driving a [`Session`] until shutdown.

use crate::config::AppConfig;
use crate::core::traits::{FrameSink, OrientationSource};
use crate::core::types::{Eye, EulerAngles};
use crate::error::{Error, Result};
use crate::session::Session;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Orientation source that always reports the same raw angles
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedOrientation(pub EulerAngles);

impl OrientationSource for FixedOrientation {
    fn current_orientation(&mut self) -> EulerAngles {
        self.0
    }
}

/// Sink that logs frame sizes and optionally keeps the newest frame per eye on disk
pub struct LoggingSink {
    dump_dir: Option<PathBuf>,
    frames: [u64; Eye::COUNT],
}

impl LoggingSink {
    /// Create the sink, creating `dump_dir` if needed
    pub fn new(dump_dir: Option<PathBuf>) -> Result<Self> {
        if let Some(dir) = &dump_dir {
            fs::create_dir_all(dir)?;
            log::info!("Writing newest frames to {}", dir.display());
        }
        Ok(Self {
            dump_dir,
            frames: [0; Eye::COUNT],
        })
    }

    /// Frames received for `eye` so far
    pub fn count(&self, eye: Eye) -> u64 {
        self.frames[eye.index()]
    }
}

/// JPEG start-of-image marker
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

impl FrameSink for LoggingSink {
    fn submit_frame(&mut self, eye: Eye, frame: Vec<u8>) -> Result<()> {
        self.frames[eye.index()] += 1;
        log::debug!("Frame for {} eye: {} bytes", eye, frame.len());

        if !frame.starts_with(&JPEG_SOI) {
            return Err(Error::Decode(format!(
                "{} byte payload is not a JPEG image",
                frame.len()
            )));
        }
        if let Some(dir) = &self.dump_dir {
            fs::write(dir.join(format!("{}.jpg", eye)), &frame)?;
        }
        Ok(())
    }
}

/// Connect and tick at the configured rate until `running` clears or the
/// downlink ends.
///
/// # Errors
/// - [`Error::ConnectFailure`] if the server is unreachable
/// - [`Error::ConnectionClosed`] if the receive loop stops on its own
pub fn run(config: &AppConfig, running: &AtomicBool) -> Result<()> {
    let mut session = Session::connect(&config.server, &config.session)?;
    let mut source = FixedOrientation(EulerAngles::from(config.host.orientation));
    let mut sink = LoggingSink::new(config.host.dump_dir.clone())?;

    let period = Duration::from_secs_f64(1.0 / f64::from(config.session.tick_rate_hz));
    log::info!(
        "Ticking at {} Hz. Press Ctrl-C to stop.",
        config.session.tick_rate_hz
    );

    let mut result = Ok(());
    while running.load(Ordering::Relaxed) {
        let started = Instant::now();
        session.tick(&mut source, &mut sink)?;

        if !session.is_receiving() {
            log::error!("Video stream ended; stopping");
            result = Err(Error::ConnectionClosed);
            break;
        }

        if let Some(rest) = period.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }

    session.shutdown()?;
    let stats = session.stats();
    log::info!(
        "Frames: {} combined, {} left, {} right ({} dropped before display)",
        sink.count(Eye::Combined),
        sink.count(Eye::Left),
        sink.count(Eye::Right),
        stats.frames_dropped
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_orientation() {
        let mut src = FixedOrientation(EulerAngles::new(1.0, 2.0, 3.0));
        assert_eq!(src.current_orientation(), EulerAngles::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_logging_sink_dumps_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = LoggingSink::new(Some(dir.path().join("out"))).unwrap();

        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xD9];
        sink.submit_frame(Eye::Left, jpeg.clone()).unwrap();
        assert_eq!(sink.count(Eye::Left), 1);
        assert_eq!(fs::read(dir.path().join("out/left.jpg")).unwrap(), jpeg);
    }

    #[test]
    fn test_logging_sink_rejects_non_jpeg() {
        let mut sink = LoggingSink::new(None).unwrap();
        let result = sink.submit_frame(Eye::Combined, vec![0x00, 0x01]);
        assert!(matches!(result, Err(Error::Decode(_))));
        assert_eq!(sink.count(Eye::Combined), 1);
    }
}
