//! Logical sides of the stereo rig and the direction of a baseline change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical side a physical sensor is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Both sides in gate lock order.
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    /// Sign applied to an offset change so that "increase" widens the baseline.
    ///
    /// The left ROI moves right (+), the right ROI moves left (-).
    pub fn baseline_sign(&self) -> i32 {
        match self {
            Side::Left => 1,
            Side::Right => -1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested change of stereo spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetDirection {
    Increase,
    Decrease,
}

impl OffsetDirection {
    /// Signed ROI offset delta for `side`.
    pub fn delta_for(&self, side: Side, magnitude: u32) -> i32 {
        let magnitude = magnitude as i32;
        match self {
            OffsetDirection::Increase => side.baseline_sign() * magnitude,
            OffsetDirection::Decrease => -side.baseline_sign() * magnitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirrored_deltas() {
        assert_eq!(OffsetDirection::Increase.delta_for(Side::Left, 4), 4);
        assert_eq!(OffsetDirection::Increase.delta_for(Side::Right, 4), -4);
        assert_eq!(OffsetDirection::Decrease.delta_for(Side::Left, 4), -4);
        assert_eq!(OffsetDirection::Decrease.delta_for(Side::Right, 4), 4);
    }
}
