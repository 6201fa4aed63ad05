//! Device driver surface
//!
//! Abstracts the vendor driver so that the capture layer can run against real
//! hardware and the simulated driver through the same API.
//!
//! Frames are pushed by the driver on threads it owns. Instead of an opaque
//! callback pointer, the driver is handed an `Arc<dyn FrameSink>`; each capture
//! channel registers its own sink, so dispatch to the right channel is a plain
//! virtual call.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    ContractError, DeviceId, FrameDims, PixelFormat, RawFrame, RoiCapabilities, RoiSettings,
    RoiValidation,
};

/// Identity and firmware details reported by a device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub serial_number: u32,
    pub model_name: String,
    pub vendor_name: String,
    pub sensor_info: String,
    pub sensor_resolution: String,
    pub firmware_version: String,
    pub firmware_build_time: String,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "*** CAMERA INFORMATION ***")?;
        writeln!(f, "Serial number - {}", self.serial_number)?;
        writeln!(f, "Camera model - {}", self.model_name)?;
        writeln!(f, "Camera vendor - {}", self.vendor_name)?;
        writeln!(f, "Sensor - {}", self.sensor_info)?;
        writeln!(f, "Resolution - {}", self.sensor_resolution)?;
        writeln!(f, "Firmware version - {}", self.firmware_version)?;
        write!(f, "Firmware build time - {}", self.firmware_build_time)
    }
}

/// Receiver of frames pushed by a streaming device.
///
/// `deliver` is invoked on a driver-owned thread, concurrently with whatever
/// else the process is doing. Implementations must not block for long.
pub trait FrameSink: Send + Sync {
    fn deliver(&self, frame: RawFrame);
}

/// Conversion of raw sensor frames to packed RGB.
pub trait PixelConverter: Send + Sync {
    /// Convert `raw` into `out`, resizing `out` to exactly the converted size.
    ///
    /// # Errors
    /// `ContractError::Conversion` when the frame is malformed or the format is
    /// not supported.
    fn convert_into(&self, raw: &RawFrame, out: &mut Vec<u8>) -> Result<FrameDims, ContractError>;

    /// Format produced by `convert_into`
    fn target_format(&self) -> PixelFormat {
        PixelFormat::Rgb8
    }
}

/// One live connection to a physical sensor.
pub trait CameraDevice: Send {
    /// Identifier the device was connected with
    fn id(&self) -> &DeviceId;

    /// Serial number, model and firmware information
    fn info(&self) -> Result<DeviceInfo, ContractError>;

    /// Custom capture window support
    fn roi_capabilities(&self) -> Result<RoiCapabilities, ContractError>;

    /// Check a window without applying it
    fn validate_roi(&self, roi: &RoiSettings) -> Result<RoiValidation, ContractError>;

    /// Apply a previously validated window
    fn apply_roi(&mut self, roi: &RoiSettings, bytes_per_packet: u32) -> Result<(), ContractError>;

    /// Begin streaming; every frame is pushed to `sink`
    fn start_capture(&mut self, sink: Arc<dyn FrameSink>) -> Result<(), ContractError>;

    /// Stop streaming.
    ///
    /// Once this returns, the sink registered by `start_capture` is not
    /// invoked again. Stopping an idle device is a no-op.
    fn stop_capture(&mut self) -> Result<(), ContractError>;

    /// Capture exactly one frame synchronously (device must not be streaming)
    fn grab_one(&mut self) -> Result<RawFrame, ContractError>;

    /// Converter matching this device's output
    fn converter(&self) -> Arc<dyn PixelConverter>;

    /// Close the connection; the device stops streaming first
    fn disconnect(&mut self) -> Result<(), ContractError>;
}

/// Bus-level access: discovery and connection
pub trait CameraDriver: Send + Sync {
    /// Devices currently attached, in bus order
    fn enumerate(&self) -> Result<Vec<DeviceId>, ContractError>;

    /// Read device information without keeping a connection open
    fn probe(&self, id: &DeviceId) -> Result<DeviceInfo, ContractError>;

    /// Open a connection
    fn connect(&self, id: &DeviceId) -> Result<Box<dyn CameraDevice>, ContractError>;
}
