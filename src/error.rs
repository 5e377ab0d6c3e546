//! Error types for stereo-link

use std::fmt;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Which part of a frame was being read when the stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStage {
    /// The 4-byte big-endian length field
    Length,
    /// The payload bytes
    Payload,
}

impl fmt::Display for ReadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadStage::Length => write!(f, "length"),
            ReadStage::Payload => write!(f, "payload"),
        }
    }
}

/// stereo-link error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not open a socket to the server (fatal to session startup)
    #[error("Failed to connect to {addr}: {source}")]
    ConnectFailure {
        /// Target address
        addr: String,
        /// Underlying socket error
        source: std::io::Error,
    },

    /// Peer closed the stream before a new frame started
    #[error("Connection closed")]
    ConnectionClosed,

    /// Peer closed the stream in the middle of a frame
    #[error("Stream closed mid-{stage}: got {received} of {expected} bytes")]
    StreamTruncated {
        /// Field being read
        stage: ReadStage,
        /// Bytes required
        expected: usize,
        /// Bytes obtained before the stream ended
        received: usize,
    },

    /// Caller violated a precondition
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Declared payload length exceeds the configured limit
    #[error("Frame too large: {length} bytes (limit {limit})")]
    FrameTooLarge {
        /// Declared payload length
        length: usize,
        /// Configured maximum
        limit: usize,
    },

    /// Writing a frame to the socket failed
    #[error("Send failed: {0}")]
    SendFailure(#[source] std::io::Error),

    /// Operation attempted after shutdown
    #[error("Session is closed")]
    SessionClosed,

    /// Configuration could not be parsed or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Background thread panicked
    #[error("Thread panic")]
    ThreadPanic,

    /// Rendering collaborator could not decode a frame
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl Error {
    /// True for errors that mean the peer went away (end of stream)
    pub fn is_disconnect(&self) -> bool {
        match self {
            Error::ConnectionClosed | Error::StreamTruncated { .. } => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
