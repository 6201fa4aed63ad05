//! # Capture
//!
//! Per-sensor acquisition for the stereo rig.
//!
//! Responsibilities:
//! - Connect a physical sensor, size and allocate its single-slot frame buffer
//! - Validate and apply capture windows (ROI)
//! - Receive driver-pushed frames, convert them and publish them into the slot
//! - Estimate the capture rate with a low-pass filter
//! - Shift both windows in mirrored directions while capture is live
//!
//! ## Usage
//!
//! ```ignore
//! use capture::SensorChannel;
//! use contracts::{Side, RoiSettings};
//!
//! let left = SensorChannel::new(Side::Left, RoiSettings::with_offset(512), 4);
//! left.connect(&driver, &device_id)?;
//! left.start()?;
//! ```

mod adjuster;
mod channel;
mod error;
mod metrics;
mod rate;
mod slot;

pub use adjuster::{OffsetAdjuster, OffsetChange};
pub use channel::{ChannelState, SensorChannel};
pub use error::{CaptureError, Result};
pub use metrics::{ChannelMetrics, ChannelMetricsSnapshot};
pub use rate::{OffsetFilter, RateEstimate};
pub use slot::{FrameSlot, FrameSnapshot, PublishedFrame};
