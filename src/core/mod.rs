//! Core abstractions shared with the host application.
//!
//! - [`traits::OrientationSource`]: supplies head orientation each tick
//! - [`traits::FrameSink`]: receives compressed frames for rendering
//! - [`types`]: eyes and raw Euler angles

pub mod traits;
pub mod types;
