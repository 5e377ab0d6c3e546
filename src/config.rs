//! Configuration for the stereo-link client
//!
//! Loaded from a TOML file. Only `[server]` is required; every other section
//! falls back to defaults.
//!
//! ```toml
//! [server]
//! mode = "dual"
//! host = "127.0.0.1"
//! control_port = 60065
//! video_port = 60064
//!
//! [session]
//! tick_rate_hz = 60
//! ```

use crate::error::{Error, Result};
use crate::protocol::message::TagSpace;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default control port (dual-port servers)
pub const DEFAULT_CONTROL_PORT: u16 = 60065;
/// Default video port (dual-port servers)
pub const DEFAULT_VIDEO_PORT: u16 = 60064;
/// Default port for multiplexed servers
pub const DEFAULT_SINGLE_PORT: u16 = 5900;
/// Default payload limit (16 MiB)
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    pub server: Topology,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub host: HostConfig,
}

/// Which sockets carry which tags
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Topology {
    /// One socket multiplexing control, acks and video
    Single { host: String, port: u16 },
    /// Control out on one socket; video in and acks out on another
    Dual {
        host: String,
        control_port: u16,
        video_port: u16,
    },
}

impl Topology {
    pub fn single(host: impl Into<String>, port: u16) -> Self {
        Topology::Single {
            host: host.into(),
            port,
        }
    }

    pub fn dual(host: impl Into<String>, control_port: u16, video_port: u16) -> Self {
        Topology::Dual {
            host: host.into(),
            control_port,
            video_port,
        }
    }

    pub fn host(&self) -> &str {
        match self {
            Topology::Single { host, .. } | Topology::Dual { host, .. } => host,
        }
    }

    /// Tag space used when the session does not override it.
    ///
    /// Multiplexed servers send per-eye streams; split servers send one
    /// side-by-side stream.
    pub fn default_tag_space(&self) -> TagSpace {
        match self {
            Topology::Single { .. } => TagSpace::Stereo,
            Topology::Dual { .. } => TagSpace::Combined,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.host().trim().is_empty() {
            return Err(Error::Config("server.host is empty".to_string()));
        }
        match *self {
            Topology::Single { port, .. } if port == 0 => {
                Err(Error::Config("server.port must be non-zero".to_string()))
            }
            Topology::Dual {
                control_port,
                video_port,
                ..
            } => {
                if control_port == 0 || video_port == 0 {
                    Err(Error::Config(
                        "server.control_port and server.video_port must be non-zero".to_string(),
                    ))
                } else if control_port == video_port {
                    Err(Error::Config(format!(
                        "control and video ports must differ (both {})",
                        control_port
                    )))
                } else {
                    Ok(())
                }
            }
            Topology::Single { .. } => Ok(()),
        }
    }
}

/// Streaming behaviour
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Host ticks per second (control frames sent at this rate)
    pub tick_rate_hz: u32,
    /// Disable Nagle coalescing on every socket
    pub no_delay: bool,
    /// Ack every video frame
    pub acknowledge_frames: bool,
    /// Negate pitch and yaw before sending
    pub invert_pitch_yaw: bool,
    /// Largest accepted video payload, 0 for unlimited
    pub max_payload_bytes: usize,
    /// Override the topology's tag space
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_space: Option<TagSpace>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            no_delay: true,
            acknowledge_frames: true,
            invert_pitch_yaw: false,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            tag_space: None,
        }
    }
}

impl SessionConfig {
    /// Effective tag space for a topology
    pub fn tag_space_for(&self, topology: &Topology) -> TagSpace {
        self.tag_space
            .unwrap_or_else(|| topology.default_tag_space())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Settings for the bundled host binary
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HostConfig {
    /// Fixed raw orientation `[pitch, yaw, roll]` in degrees
    pub orientation: [f32; 3],
    /// Directory the newest frame per eye is written to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dump_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        if self.session.tick_rate_hz == 0 {
            return Err(Error::Config("session.tick_rate_hz must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Local dual-port server on the standard ports
    pub fn local_defaults() -> Self {
        Self {
            server: Topology::dual("127.0.0.1", DEFAULT_CONTROL_PORT, DEFAULT_VIDEO_PORT),
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
            host: HostConfig::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::local_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server, Topology::dual("127.0.0.1", 60065, 60064));
        assert_eq!(config.session.tick_rate_hz, 60);
        assert!(config.session.no_delay);
        assert!(config.session.acknowledge_frames);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_single_port_minimal() {
        let config = AppConfig::from_toml(
            r#"
[server]
mode = "single"
host = "10.0.0.5"
port = 5900
"#,
        )
        .unwrap();
        assert_eq!(config.server, Topology::single("10.0.0.5", DEFAULT_SINGLE_PORT));
        assert_eq!(config.session, SessionConfig::default());
        assert_eq!(
            config.session.tag_space_for(&config.server),
            TagSpace::Stereo
        );
    }

    #[test]
    fn test_full_deserialization() {
        let config = AppConfig::from_toml(
            r#"
[server]
mode = "dual"
host = "robot.local"
control_port = 7001
video_port = 7000

[session]
tick_rate_hz = 90
no_delay = false
acknowledge_frames = false
invert_pitch_yaw = true
max_payload_bytes = 0
tag_space = "stereo"

[logging]
level = "debug"

[host]
orientation = [10.0, 350.0, 0.0]
dump_dir = "/tmp/frames"
"#,
        )
        .unwrap();
        assert_eq!(config.server.host(), "robot.local");
        assert_eq!(config.session.tick_rate_hz, 90);
        assert!(!config.session.no_delay);
        assert!(config.session.invert_pitch_yaw);
        assert_eq!(
            config.session.tag_space_for(&config.server),
            TagSpace::Stereo
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.host.orientation, [10.0, 350.0, 0.0]);
        assert_eq!(config.host.dump_dir, Some(PathBuf::from("/tmp/frames")));
    }

    #[test]
    fn test_validation_errors() {
        let same_ports = r#"
[server]
mode = "dual"
host = "h"
control_port = 5000
video_port = 5000
"#;
        assert!(matches!(AppConfig::from_toml(same_ports), Err(Error::Config(_))));

        let zero_port = r#"
[server]
mode = "single"
host = "h"
port = 0
"#;
        assert!(matches!(AppConfig::from_toml(zero_port), Err(Error::Config(_))));

        let empty_host = r#"
[server]
mode = "single"
host = " "
port = 1
"#;
        assert!(matches!(AppConfig::from_toml(empty_host), Err(Error::Config(_))));

        let mut config = AppConfig::default();
        config.session.tick_rate_hz = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_mode_rejected() {
        let result = AppConfig::from_toml(
            r#"
[server]
host = "h"
port = 1
"#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo-link.toml");

        let mut config = AppConfig::default();
        config.session.invert_pitch_yaw = true;
        config.host.dump_dir = Some(dir.path().join("frames"));
        config.to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[server]"));
        assert!(text.contains("mode = \"dual\""));

        let loaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
