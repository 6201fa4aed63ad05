//! # Sensor Driver
//!
//! Simulated vendor driver for the stereo rig.
//!
//! Responsibilities:
//! - Enumerate and probe simulated sensors from the `[simulator]` blueprint section
//! - Stream synthetic frames on a driver-owned thread per device
//! - Validate and apply custom capture windows against sensor capabilities
//! - Convert raw Bayer / mono / RGB frames to packed RGB
//! - Inject connection and conversion failures for tests

pub mod converter;
pub mod error;
pub mod mock_camera;
pub mod mock_driver;

pub use converter::RgbConverter;
pub use error::{Result, SensorDriverError};
pub use mock_camera::{MockCamera, MockCameraConfig};
pub use mock_driver::MockDriver;
