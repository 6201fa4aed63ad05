//! OffsetAdjuster - mirrored stereo spacing change on both channels

use contracts::{OffsetDirection, Side};
use tracing::{info, instrument};

use crate::channel::SensorChannel;
use crate::error::Result;

/// Offsets after an adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetChange {
    pub left: i32,
    pub right: i32,
}

/// Applies one fixed step to both channels, LEFT first.
#[derive(Debug, Clone, Copy)]
pub struct OffsetAdjuster {
    magnitude: u32,
}

impl OffsetAdjuster {
    pub fn new(magnitude: u32) -> Self {
        Self { magnitude }
    }

    /// Shift both windows; each channel restarts its own capture.
    ///
    /// Stops at the first failure, which leaves that channel stopped.
    #[instrument(name = "offset_adjust", skip(self, left, right))]
    pub fn apply(
        &self,
        direction: OffsetDirection,
        left: &SensorChannel,
        right: &SensorChannel,
    ) -> Result<OffsetChange> {
        debug_assert_eq!(left.side(), Side::Left);
        debug_assert_eq!(right.side(), Side::Right);

        let left = left.adjust_offset(direction, self.magnitude)?;
        let right = right.adjust_offset(direction, self.magnitude)?;
        info!(?direction, left, right, "stereo spacing changed");
        Ok(OffsetChange { left, right })
    }
}
