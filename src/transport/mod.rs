//! Transport layer: sockets, serialized frame writes, and test doubles

mod connection;
pub mod mock;
mod writer;

pub use connection::Connection;
pub use writer::FrameWriter;

/// Something that can be closed out from under a blocked reader
pub trait Closer: Send + Sync {
    /// Close the underlying resource.
    ///
    /// Idempotent; returns `true` only for the call that actually closed it.
    fn close(&self) -> bool;
}
