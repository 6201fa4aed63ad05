//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the stereo rig.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Frame arrival is stamped with a monotonic `Instant` by the capture channel
//! - Data-log timestamps are milliseconds relative to each clock's own epoch
//!   (session start for the display, first frame for each channel)

mod blueprint;
mod command;
mod device;
mod device_id;
mod display;
mod error;
mod frame;
mod record;
mod roi;
mod side;

pub use blueprint::*;
pub use command::OperatorCommand;
pub use device::{CameraDevice, CameraDriver, DeviceInfo, FrameSink, PixelConverter};
pub use device_id::DeviceId;
pub use display::{CompositeLayout, DisplaySurface, ImageView, Viewport};
pub use error::*;
pub use frame::{FrameDims, PixelFormat, RawFrame};
pub use record::DataRecord;
pub use roi::{PacketInfo, RoiCapabilities, RoiSettings, RoiValidation};
pub use side::{OffsetDirection, Side};
