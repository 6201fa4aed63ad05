//! SynchronizationGate - "do both channels have a frame not yet consumed?"

use std::sync::Arc;

use capture::{FrameSnapshot, SensorChannel};
use contracts::Side;

/// Frames taken from both channels in one gate pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePair {
    pub left: FrameSnapshot,
    pub right: FrameSnapshot,
}

/// Stateless gate over the two channel slots.
///
/// Both slots are locked (LEFT, then RIGHT) for the whole check-and-take, so
/// flags are never observed or cleared one at a time.
pub struct SynchronizationGate {
    left: Arc<SensorChannel>,
    right: Arc<SensorChannel>,
}

impl SynchronizationGate {
    pub fn new(left: Arc<SensorChannel>, right: Arc<SensorChannel>) -> Self {
        debug_assert_eq!(left.side(), Side::Left);
        debug_assert_eq!(right.side(), Side::Right);
        Self { left, right }
    }

    pub fn left(&self) -> &Arc<SensorChannel> {
        &self.left
    }

    pub fn right(&self) -> &Arc<SensorChannel> {
        &self.right
    }

    /// Both channels hold an unconsumed frame
    pub fn is_ready(&self) -> bool {
        let left = self.left.lock_slot();
        let right = self.right.lock_slot();
        left.has_new_frame() && right.has_new_frame()
    }

    /// Copy both pending frames out and clear both flags.
    ///
    /// Returns `None` and leaves both slots untouched unless both are ready.
    pub fn try_consume(&self, left_out: &mut Vec<u8>, right_out: &mut Vec<u8>) -> Option<FramePair> {
        let mut left = self.left.lock_slot();
        let mut right = self.right.lock_slot();
        if !(left.has_new_frame() && right.has_new_frame()) {
            return None;
        }
        let left = left.consume_into(left_out)?;
        let right = right.consume_into(right_out)?;
        Some(FramePair { left, right })
    }
}
