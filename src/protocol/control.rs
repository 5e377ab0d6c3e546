//! Control channel encoding
//!
//! Each tick the local head orientation is sent as an ASCII CSV payload:
//!
//! ```text
//! 0x01 | len (BE u32) | "<pitch>,<yaw>,<roll>"   e.g. "-10.0,45.0,0.0"
//! ```
//!
//! Angles are normalized from the tracker's `[0, 360)` range to `(-180, 180]`
//! and printed with exactly one fractional digit.

use super::message::{Message, TAG_CONTROL};
use crate::core::types::EulerAngles;
use std::fmt::Write as _;

/// Head orientation in degrees, each axis in `(-180, 180]`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationSample {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Post-normalization axis adjustments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrientationMapping {
    /// Negate pitch and yaw (multiplexed servers expect the mirrored frame)
    pub invert_pitch_yaw: bool,
}

/// Map a raw Euler angle to `(-180, 180]`.
///
/// Inputs outside `[0, 360)` are wrapped first.
#[inline]
pub fn normalize_angle(raw: f32) -> f32 {
    let wrapped = raw.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

impl OrientationSample {
    /// Normalize raw tracker angles
    pub fn from_raw(raw: EulerAngles) -> Self {
        Self {
            pitch: normalize_angle(raw.x),
            yaw: normalize_angle(raw.y),
            roll: normalize_angle(raw.z),
        }
    }

    /// Normalize raw angles and apply the axis mapping
    pub fn from_raw_mapped(raw: EulerAngles, mapping: OrientationMapping) -> Self {
        let mut sample = Self::from_raw(raw);
        if mapping.invert_pitch_yaw {
            sample.pitch = -sample.pitch;
            sample.yaw = -sample.yaw;
        }
        sample
    }

    /// `"<pitch>,<yaw>,<roll>"`, one decimal each
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(24);
        // Writing into a String cannot fail
        let _ = write!(
            out,
            "{:.1},{:.1},{:.1}",
            positive_zero(self.pitch),
            positive_zero(self.yaw),
            positive_zero(self.roll)
        );
        out
    }
}

/// Fold `-0.0` into `0.0` so it never prints with a sign
#[inline]
fn positive_zero(v: f32) -> f32 {
    v + 0.0
}

/// Build the Control message for a sample
pub fn encode_control(sample: &OrientationSample) -> Message {
    Message::new(TAG_CONTROL, sample.to_csv().into_bytes())
}
