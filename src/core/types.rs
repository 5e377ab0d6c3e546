//! Core data types exchanged with the tracking and rendering layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which eye (or both, side by side) a frame is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Eye {
    /// Single side-by-side frame carrying both eyes
    Combined,
    Left,
    Right,
}

impl Eye {
    /// Number of distinct eye slots
    pub const COUNT: usize = 3;

    /// All eyes in slot order
    pub const ALL: [Eye; Eye::COUNT] = [Eye::Combined, Eye::Left, Eye::Right];

    /// Slot index
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Eye::Combined => 0,
            Eye::Left => 1,
            Eye::Right => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Eye::Combined => "combined",
            Eye::Left => "left",
            Eye::Right => "right",
        }
    }
}

impl fmt::Display for Eye {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw tracker rotation in degrees, nominally `[0, 360)` per axis.
///
/// `x` is pitch, `y` is yaw, `z` is roll.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerAngles {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl EulerAngles {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for EulerAngles {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_indices_unique() {
        let mut seen = [false; Eye::COUNT];
        for eye in Eye::ALL {
            assert!(!seen[eye.index()]);
            seen[eye.index()] = true;
        }
    }
}
