//! Video downlink: background receive loop and link counters

pub mod receiver;
pub mod stats;

pub use receiver::{Dispatch, Receiver, ReceiverConfig};
pub use stats::{LinkStats, StatsSnapshot};
