//! TCP connection with idempotent close
//!
//! The receive thread reads from a clone of the stream while the owner keeps
//! the owned handle for writes and shutdown. `shutdown(Both)` on any handle
//! unblocks a read pending on another, which is how the session interrupts
//! the receive thread.

use super::Closer;
use super::writer::FrameWriter;
use crate::error::{Error, Result};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};

/// One connected TCP socket
pub struct Connection {
    label: &'static str,
    stream: TcpStream,
    peer: SocketAddr,
    closed: AtomicBool,
}

impl Connection {
    /// Connect to `addr` ("host:port").
    ///
    /// # Arguments
    /// - `label`: name used in log lines ("video", "control", "link")
    /// - `addr`: server address
    /// - `no_delay`: disable Nagle coalescing
    ///
    /// # Errors
    /// [`Error::ConnectFailure`] if the socket cannot be opened
    pub fn open(label: &'static str, addr: &str, no_delay: bool) -> Result<Self> {
        let stream = TcpStream::connect(addr).map_err(|source| Error::ConnectFailure {
            addr: addr.to_string(),
            source,
        })?;
        if no_delay && let Err(e) = stream.set_nodelay(true) {
            log::warn!("Failed to set TCP_NODELAY on {} socket: {}", label, e);
        }
        let peer = stream.peer_addr()?;
        log::info!("Connected {} to {}", label, peer);
        Ok(Self {
            label,
            stream,
            peer,
            closed: AtomicBool::new(false),
        })
    }

    /// Independent handle for a reader thread
    pub fn reader(&self) -> Result<TcpStream> {
        Ok(self.stream.try_clone()?)
    }

    /// Serialized frame writer over a clone of this socket
    pub fn writer(&self) -> Result<FrameWriter<TcpStream>> {
        Ok(FrameWriter::new(self.stream.try_clone()?))
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Closer for Connection {
    fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => log::debug!("Closed {} socket ({})", self.label, self.peer),
            // Peer already tore the connection down
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => {
                log::debug!("{} socket already disconnected", self.label)
            }
            Err(e) => log::warn!("Error closing {} socket: {}", self.label, e),
        }
        true
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}
